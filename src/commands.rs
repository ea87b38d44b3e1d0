//! CLI Command Handlers
//!
//! Each handler takes CLI args and Output, returns ExitCode.

use std::path::Path;

use crate::cli::{AtCmd, AtResponse, CuesCmd, CuesResponse, ExitCode, Output, PreviewCmd};
use crate::config::Config;
use crate::error::SubtitleError;
use crate::models::{SubFormat, SubtitleCue, SubtitleSource};
use crate::subtitle::{self, SubtitleLoader};
use crate::ui::preview;

/// Read and parse a subtitle file; an explicit format beats the extension
async fn load_cues(
    path: &Path,
    format: Option<SubFormat>,
) -> Result<(SubFormat, Vec<SubtitleCue>), SubtitleError> {
    let source = SubtitleSource::new("", "", path.to_string_lossy());
    let loaded = SubtitleLoader::new().without_cache().load(&source).await?;

    let format = format
        .or(loaded.format)
        .unwrap_or_else(|| subtitle::detect_format(&loaded.content));
    Ok((format, subtitle::parse(&loaded.content, Some(format))))
}

fn load_error(output: &Output, path: &Path, e: SubtitleError) -> ExitCode {
    let code = match e {
        SubtitleError::Http(_) | SubtitleError::Status(_) => ExitCode::NetworkError,
        _ => ExitCode::Error,
    };
    output.error(format!("Failed to read {}: {}", path.display(), e), code)
}

// =============================================================================
// Cues Command
// =============================================================================

pub async fn cues_cmd(cmd: CuesCmd, output: &Output) -> ExitCode {
    let (format, mut cues) = match load_cues(&cmd.file, cmd.format.map(Into::into)).await {
        Ok(parsed) => parsed,
        Err(e) => return load_error(output, &cmd.file, e),
    };

    if cues.is_empty() {
        return output.error(
            format!("No cues found in {}", cmd.file.display()),
            ExitCode::NoCues,
        );
    }

    let count = cues.len();
    if let Some(limit) = cmd.limit {
        cues.truncate(limit);
    }

    if !output.json {
        output.info(format!("{} cues ({})", count, format));
        for cue in &cues {
            println!("{}", cue);
        }
        return ExitCode::Success;
    }

    let response = CuesResponse {
        file: cmd.file.display().to_string(),
        format,
        count,
        cues,
    };
    if let Err(e) = output.print(&response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// At Command
// =============================================================================

pub async fn at_cmd(cmd: AtCmd, output: &Output) -> ExitCode {
    let Some(position) = cmd.parse_position() else {
        return output.error(
            format!("Invalid position: {}", cmd.position),
            ExitCode::InvalidArgs,
        );
    };

    let (_, cues) = match load_cues(&cmd.file, cmd.format.map(Into::into)).await {
        Ok(parsed) => parsed,
        Err(e) => return load_error(output, &cmd.file, e),
    };
    if cues.is_empty() {
        return output.error(
            format!("No cues found in {}", cmd.file.display()),
            ExitCode::NoCues,
        );
    }

    let text = subtitle::active_text(&cues, position, cmd.delay_ms).to_string();

    if !output.json {
        if !text.is_empty() {
            println!("{}", text);
        }
        return ExitCode::Success;
    }

    let response = AtResponse {
        position,
        delay_ms: cmd.delay_ms,
        text,
    };
    if let Err(e) = output.print(&response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Preview Command
// =============================================================================

pub async fn preview_cmd(cmd: PreviewCmd, config: Config, output: &Output) -> ExitCode {
    if let Err(e) = cmd.validate() {
        return output.error(e, ExitCode::InvalidArgs);
    }
    if let Some(missing) = cmd.files.iter().find(|f| !f.exists()) {
        return output.error(
            format!("Subtitle file not found: {}", missing.display()),
            ExitCode::InvalidArgs,
        );
    }

    let summary = match preview::run(&cmd, config).await {
        Ok(summary) => summary,
        Err(e) => return output.error(format!("Preview failed: {}", e), ExitCode::Error),
    };

    if output.json {
        if let Err(e) = output.print(&summary) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        output.info(format!(
            "{}: stopped at {:.1}% on the {} backend",
            summary.title,
            summary.progress * 100.0,
            summary.backend
        ));
        if let Some(error) = &summary.error {
            output.info(format!("Last error: {}", error));
        }
    }
    ExitCode::Success
}
