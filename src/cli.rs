use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// YouTube's built-in captions
    Caption,
    /// RapidAPI YouTube Transcriptor (needs RAPIDAPI_KEY)
    Rapidapi,
}

impl Provider {
    pub fn parse(name: &str) -> Option<Self> {
        <Self as clap::ValueEnum>::from_str(name, true).ok()
    }
}

#[derive(Parser)]
#[command(
    name = "gifclip",
    about = "Find theme-matching moments in videos and render them as captioned GIFs",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Show extraction method and metadata
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List transcript languages available for a video
    Languages {
        /// YouTube video URL or video ID
        url: String,

        #[arg(short, long, value_enum)]
        provider: Option<Provider>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Suggest GIF moments from a YouTube video's transcript
    Moments(MomentsArgs),

    /// Suggest evenly spaced GIF moments for a local video file
    Local {
        /// Path to the video file
        file: PathBuf,

        /// Theme the moments should match
        #[arg(short, long)]
        theme: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Render one GIF from a video segment
    Gif(GifArgs),
}

#[derive(Args)]
pub struct MomentsArgs {
    /// YouTube video URL or video ID
    pub url: String,

    /// Theme the moments should match
    #[arg(short, long)]
    pub theme: String,

    /// Transcript language code
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Transcript provider
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// Skip LLM analysis and use local keyword/positional selection
    #[arg(long)]
    pub offline: bool,

    /// Ignore the transcript cache
    #[arg(long)]
    pub refresh: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Download the video and render every suggestion as a GIF
    #[arg(short, long)]
    pub render: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["video", "file"])))]
pub struct GifArgs {
    /// YouTube video URL or video ID to download
    #[arg(long)]
    pub video: Option<String>,

    /// Local video file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Clip start, in seconds
    #[arg(short, long)]
    pub start: f64,

    /// Clip length, in seconds
    #[arg(short, long)]
    pub duration: f64,

    /// Caption drawn at the bottom of the GIF
    #[arg(short, long, default_value = "")]
    pub caption: String,

    /// Translate the caption to English before drawing it
    #[arg(long)]
    pub translate: bool,

    /// Output GIF path (defaults to a new file in the output directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("rapidapi"), Some(Provider::Rapidapi));
        assert_eq!(Provider::parse("Caption"), Some(Provider::Caption));
        assert_eq!(Provider::parse("whisper"), None);
    }

    #[test]
    fn test_parse_moments_command() {
        let cli = Cli::try_parse_from([
            "gifclip", "moments", "dQw4w9WgXcQ", "--theme", "dance moves", "--offline", "-f", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Moments(args) => {
                assert_eq!(args.theme, "dance moves");
                assert!(args.offline);
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.provider.is_none());
            }
            _ => panic!("expected moments"),
        }
    }

    #[test]
    fn test_gif_requires_a_source() {
        assert!(Cli::try_parse_from(["gifclip", "gif", "--start", "1", "--duration", "2"]).is_err());
        assert!(
            Cli::try_parse_from(["gifclip", "gif", "--file", "a.mp4", "--video", "x", "-s", "1", "-d", "2"]).is_err()
        );
        assert!(Cli::try_parse_from(["gifclip", "gif", "--file", "a.mp4", "-s", "1", "-d", "2"]).is_ok());
    }
}
