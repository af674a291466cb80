use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use vidlens_core::Settings;
use vidlens_understanding::{PromptKind, VideoAnalyzer, VideoReference};

const DEFAULT_QUESTION: &str = "Describe the main content of this video.";

#[derive(Parser)]
#[command(name = "vidlens")]
#[command(about = "Video analysis with a multimodal model; accepts local paths and internet URLs")]
#[command(version)]
struct Cli {
    /// Video file path or URL (e.g. https://example.com/video.mp4)
    #[arg(long = "video-path", alias = "video_path", env = "VIDEO_PATH")]
    video_path: String,

    /// Question to ask about the video
    #[arg(long, env = "VIDEO_QUESTION", default_value = DEFAULT_QUESTION)]
    question: String,

    /// What to ask for
    #[arg(long, value_enum, default_value_t = Mode::Ask)]
    mode: Mode,

    /// Frame sampling rate; defaults to VIDEO_DEFAULT_FPS
    #[arg(long)]
    fps: Option<f64>,

    /// Also write JSON logs to this directory
    #[arg(long, env = "VIDLENS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Ask the question given with --question
    Ask,
    /// Detailed summary
    Summary,
    /// Scene-by-scene breakdown
    Scenes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    vidlens_logging::init_logger(cli.log_dir.as_deref(), &cli.log_level);

    let settings = Arc::new(Settings::from_env().context("Failed to load settings")?);
    info!(settings = ?settings, "Loaded settings");

    let analyzer = VideoAnalyzer::dashscope(settings);

    let kind = match cli.mode {
        Mode::Ask => PromptKind::Custom(cli.question.clone()),
        Mode::Summary => PromptKind::Summary,
        Mode::Scenes => PromptKind::Scenes,
    };

    let reference = VideoReference::new(cli.video_path.as_str());
    let outcome = match analyzer.builder().build_prompt(&reference, &kind, cli.fps) {
        Ok(request) => analyzer.submit(request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) if cli.json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Ok(result) => {
            println!("Analysis result:");
            println!("{}", result.text);
        }
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "vidlens",
            "--video_path",
            "https://example.com/clip.mp4",
            "--mode",
            "scenes",
            "--fps",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.video_path, "https://example.com/clip.mp4");
        assert!(matches!(cli.mode, Mode::Scenes));
        assert_eq!(cli.fps, Some(2.0));
    }
}
