//! CLI Command Tests
//!
//! Argument parsing plus the cues/at handlers against files on disk.
//! Covers JSON output types, exit codes, and input validation.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use std::path::PathBuf;
    use streamplay::cli::{Cli, Command, ExitCode as CliExitCode, FormatArg};

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["streamplay"]).is_err());
    }

    #[test]
    fn test_cues_command_basic() {
        let cli = Cli::parse_from(["streamplay", "cues", "movie.en.srt"]);
        match cli.command {
            Command::Cues(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("movie.en.srt"));
                assert!(cmd.format.is_none());
                assert!(cmd.limit.is_none());
            }
            _ => panic!("Expected Cues command"),
        }
    }

    #[test]
    fn test_cues_alias_and_flags() {
        let cli = Cli::parse_from(["streamplay", "c", "ep.txt", "--format", "srt", "-n", "5", "--json"]);
        assert!(cli.json);
        match cli.command {
            Command::Cues(cmd) => {
                assert_eq!(cmd.format, Some(FormatArg::Srt));
                assert_eq!(cmd.limit, Some(5));
            }
            _ => panic!("Expected Cues command"),
        }
    }

    #[test]
    fn test_at_command_timestamp() {
        let cli = Cli::parse_from(["streamplay", "at", "movie.srt", "1:02:03", "-d", "500"]);
        match cli.command {
            Command::At(cmd) => {
                assert_eq!(cmd.parse_position(), Some(3723.0));
                assert_eq!(cmd.delay_ms, 500);
            }
            _ => panic!("Expected At command"),
        }
    }

    #[test]
    fn test_at_requires_position() {
        assert!(Cli::try_parse_from(["streamplay", "at", "movie.srt"]).is_err());
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["streamplay", "cues", "movie.srt", "-f", "ass"]).is_err());
    }

    #[test]
    fn test_preview_defaults() {
        let cli = Cli::parse_from(["streamplay", "preview", "a.srt", "b.vtt"]);
        match cli.command {
            Command::Preview(cmd) => {
                assert_eq!(cmd.files.len(), 2);
                assert_eq!(cmd.duration, 600.0);
                assert_eq!(cmd.start, None);
                assert!(!cmd.fail_primary);
                assert_eq!(cmd.title, "Preview");
                assert_eq!(cmd.url, "clock://preview");
                assert!(cmd.validate().is_ok());
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_preview_flags() {
        let cli = Cli::parse_from([
            "streamplay",
            "p",
            "--duration",
            "90",
            "--start",
            "0.5",
            "--fail-primary",
            "-t",
            "Pilot",
        ]);
        match cli.command {
            Command::Preview(cmd) => {
                assert_eq!(cmd.duration, 90.0);
                assert_eq!(cmd.start, Some(0.5));
                assert!(cmd.fail_primary);
                assert_eq!(cmd.title, "Pilot");
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_preview_rejects_bad_duration() {
        let cli = Cli::parse_from(["streamplay", "preview", "--duration", "0"]);
        match cli.command {
            Command::Preview(cmd) => assert!(cmd.validate().is_err()),
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["streamplay", "cues", "movie.srt", "-q", "-c", "/tmp/c.toml"]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(i32::from(CliExitCode::Success), 0);
        assert_eq!(i32::from(CliExitCode::Error), 1);
        assert_eq!(i32::from(CliExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(CliExitCode::NetworkError), 3);
        assert_eq!(i32::from(CliExitCode::NoCues), 7);
    }
}

// =============================================================================
// JSON Output Tests
// =============================================================================

mod json_output {
    use streamplay::cli::{AtResponse, ExitCode, JsonOutput, PreviewSummary};

    #[test]
    fn test_success_omits_error_and_code() {
        let output = JsonOutput::success(AtResponse {
            position: 12.5,
            delay_ms: -250,
            text: "Hello".into(),
        });
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["data"]["text"], "Hello");
        assert_eq!(json["data"]["delay_ms"], -250);
        assert!(json.get("error").is_none());
        assert!(json.get("exit_code").is_none());
    }

    #[test]
    fn test_error_carries_exit_code() {
        let output = JsonOutput::<()>::error_msg("No cues found", ExitCode::NoCues);
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["error"], "No cues found");
        assert_eq!(json["exit_code"], 7);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_preview_summary_without_error() {
        let summary = PreviewSummary {
            title: "Movie".into(),
            progress: 0.25,
            backend: "secondary".into(),
            error: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["backend"], "secondary");
        assert!(json.get("error").is_none());
    }
}

// =============================================================================
// Command Handler Tests
// =============================================================================

mod handlers {
    use std::path::PathBuf;

    use streamplay::cli::{AtCmd, CuesCmd, ExitCode, FormatArg, Output, PreviewCmd};
    use streamplay::commands::{at_cmd, cues_cmd, preview_cmd};
    use streamplay::config::Config;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:03,000\nFirst\n\n2\n00:00:05,000 --> 00:00:07,000\nSecond\n";

    fn quiet() -> Output {
        Output {
            json: false,
            quiet: true,
        }
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_cues_success() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "movie.en.srt", SRT);

        let cmd = CuesCmd {
            file,
            format: None,
            limit: Some(1),
        };
        assert_eq!(cues_cmd(cmd, &quiet()).await, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_cues_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "empty.srt", "nothing to see\n");

        let cmd = CuesCmd {
            file,
            format: None,
            limit: None,
        };
        assert_eq!(cues_cmd(cmd, &quiet()).await, ExitCode::NoCues);
    }

    #[tokio::test]
    async fn test_cues_missing_file() {
        let cmd = CuesCmd {
            file: PathBuf::from("/nonexistent/streamplay/movie.srt"),
            format: None,
            limit: None,
        };
        assert_eq!(cues_cmd(cmd, &quiet()).await, ExitCode::Error);
    }

    #[tokio::test]
    async fn test_cues_format_override() {
        let dir = tempfile::tempdir().unwrap();
        // Header-less VTT body in a file with no useful extension
        let file = write(&dir, "subs.txt", "00:00:01.000 --> 00:00:02.000\nhinted\n");

        let detected = CuesCmd {
            file: file.clone(),
            format: None,
            limit: None,
        };
        assert_eq!(cues_cmd(detected, &quiet()).await, ExitCode::NoCues);

        let forced = CuesCmd {
            file,
            format: Some(FormatArg::Vtt),
            limit: None,
        };
        assert_eq!(cues_cmd(forced, &quiet()).await, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_at_success_and_invalid_position() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "movie.srt", SRT);

        let ok = AtCmd {
            file: file.clone(),
            position: "00:02".into(),
            delay_ms: 0,
            format: None,
        };
        assert_eq!(at_cmd(ok, &quiet()).await, ExitCode::Success);

        let bad = AtCmd {
            file,
            position: "later".into(),
            delay_ms: 0,
            format: None,
        };
        assert_eq!(at_cmd(bad, &quiet()).await, ExitCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_preview_rejects_missing_subtitle_file() {
        let cmd = PreviewCmd {
            files: vec![PathBuf::from("/nonexistent/streamplay/a.srt")],
            duration: 60.0,
            start: None,
            fail_primary: false,
            title: "Preview".into(),
            url: "clock://preview".into(),
        };
        assert_eq!(
            preview_cmd(cmd, Config::default(), &quiet()).await,
            ExitCode::InvalidArgs
        );
    }

    #[tokio::test]
    async fn test_preview_rejects_bad_start() {
        let cmd = PreviewCmd {
            files: vec![],
            duration: 60.0,
            start: Some(2.0),
            fail_primary: false,
            title: "Preview".into(),
            url: "clock://preview".into(),
        };
        assert_eq!(
            preview_cmd(cmd, Config::default(), &quiet()).await,
            ExitCode::InvalidArgs
        );
    }
}
