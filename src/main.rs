use std::path::{Path, PathBuf};
use std::process::Command as Process;
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::{debug, info, warn};

mod cli;

use cli::{Cli, Command, GifArgs, MomentsArgs, OutputFormat, Provider};
use gifclip::config::Config;
use gifclip::output::{self, Suggestions};
use gifclip::render::GifSettings;
use gifclip::{Transcript, TranscriptSource, analyze, cache, locate, moments, rapidapi, render, youtube};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("gifclip.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    gifclip::config::data_dir().join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Process::new(name)
        .arg(if name.starts_with("ff") { "-version" } else { "--version" })
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let tool_line = |name: &str, purpose: &str| match tool_version(name) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m {name:<8} {v}"),
        None => format!("  \x1b[31m❌\x1b[0m {name:<8} (not found, needed for {purpose})"),
    };

    let log_path = log_dir().join("gifclip.log");

    format!(
        "\nREQUIRED TOOLS:\n{}\n{}\n\nENVIRONMENT:\n  GEMINI_API_KEY  moment analysis and caption translation\n  RAPIDAPI_KEY    the rapidapi transcript provider\n\nLogs are written to: {}",
        tool_line("yt-dlp", "rendering YouTube videos"),
        tool_line("ffmpeg", "rendering GIFs"),
        log_path.display()
    )
}

/// Retry an async operation with exponential backoff
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt + 1 >= max_attempts => return Err(e),
            Err(e) => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// CLI flag, then config file, then captions
fn resolve_provider(flag: Option<Provider>, config: &Config) -> Provider {
    flag.or_else(|| config.default_provider.as_deref().and_then(Provider::parse))
        .unwrap_or(Provider::Caption)
}

fn source_for(provider: Provider) -> TranscriptSource {
    match provider {
        Provider::Caption => TranscriptSource::Caption,
        Provider::Rapidapi => TranscriptSource::RapidApi,
    }
}

async fn list_languages(
    client: &reqwest::Client,
    config: &Config,
    provider: Provider,
    video_id: &str,
) -> Result<Vec<gifclip::Language>> {
    match provider {
        Provider::Caption => youtube::list_languages(client, video_id).await,
        Provider::Rapidapi => rapidapi::list_languages(client, config.rapidapi_host(), video_id).await,
    }
}

async fn fetch_transcript(
    client: &reqwest::Client,
    config: &Config,
    provider: Provider,
    video_id: &str,
    lang: &str,
    refresh: bool,
) -> Result<Transcript> {
    let cache_dir = cache::cache_dir();
    let source = source_for(provider);
    if !refresh {
        if let Some(cached) = cache::load(&cache_dir, video_id, lang, source) {
            info!("Using cached transcript for {video_id} ({lang})");
            return Ok(cached);
        }
    }

    let transcript = retry(3, || async move {
        match provider {
            Provider::Caption => youtube::fetch_captions(client, video_id, lang).await,
            Provider::Rapidapi => rapidapi::fetch_transcript(client, config.rapidapi_host(), video_id, lang).await,
        }
    })
    .await
    .wrap_err_with(|| format!("could not retrieve a transcript for {video_id} via {source}"))?;

    if let Err(e) = cache::save(&cache_dir, &transcript, lang) {
        warn!("Failed to cache transcript: {e}");
    }
    Ok(transcript)
}

fn emit(rendered: &str, output: Option<&Path>, verbose: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            if verbose {
                eprintln!("Output written to: {}", path.display());
            }
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn new_gif_path(config: &Config) -> PathBuf {
    config.output_dir().join(format!("{}.gif", uuid::Uuid::new_v4()))
}

async fn run_moments(client: &reqwest::Client, config: &Config, args: MomentsArgs, verbose: bool) -> Result<()> {
    let video_id = youtube::extract_video_id(&args.url)?;
    let provider = resolve_provider(args.provider, config);
    let lang = args
        .lang
        .clone()
        .or_else(|| config.default_lang.clone())
        .unwrap_or_else(|| "en".to_string());

    info!("Processing {video_id} with theme {:?} in {lang}", args.theme);
    let transcript = fetch_transcript(client, config, provider, &video_id, &lang, args.refresh).await?;

    let language_name = match list_languages(client, config, provider, &video_id).await {
        Ok(languages) => languages
            .into_iter()
            .find(|l| l.language_code == transcript.language)
            .map(|l| l.language_name)
            .unwrap_or_else(|| gifclip::language_name(&transcript.language)),
        Err(e) => {
            debug!("Language lookup failed: {e}");
            gifclip::language_name(&transcript.language)
        }
    };

    if verbose {
        eprintln!(
            "Video: {} ({})\nSource: {}\nLanguage: {} ({})\nEntries: {}",
            transcript.title,
            transcript.video_id,
            transcript.source,
            language_name,
            transcript.language,
            transcript.entries.len(),
        );
    }

    let analysis = if args.offline {
        None
    } else if transcript.entries.is_empty() {
        warn!("Transcript for {video_id} is empty, skipping analysis");
        None
    } else {
        match analyze::find_moments(client, &transcript.entries, &args.theme, &language_name, config.gemini_model())
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Gemini analysis unavailable, using fallback: {e}");
                if verbose {
                    eprintln!("Analysis unavailable ({e}), using local selection");
                }
                None
            }
        }
    };

    let selection = moments::select(&transcript.entries, &args.theme, analysis.as_ref());
    let gif_suggestions = locate::enrich(&transcript.entries, selection.moments);
    info!("Found {} GIF suggestions for {video_id}", gif_suggestions.len());

    let suggestions = Suggestions {
        video_id: Some(video_id.clone()),
        file: None,
        language_code: Some(transcript.language.clone()),
        language_name: Some(language_name),
        selection: selection.tier,
        gif_suggestions,
    };

    let rendered = match args.format {
        OutputFormat::Text => output::render_text(&suggestions),
        OutputFormat::Json => output::render_json(&suggestions),
    };
    emit(&rendered, args.output.as_deref(), verbose)?;

    if args.render && !suggestions.gif_suggestions.is_empty() {
        let video_path = youtube::download_video(&video_id, &config.download_dir())?;
        let settings = GifSettings::default();
        for m in &suggestions.gif_suggestions {
            let gif = render::create_gif(
                &video_path,
                m.start_time,
                m.duration,
                &m.moment.quote,
                &new_gif_path(config),
                &settings,
            )?;
            eprintln!("GIF: {}", gif.display());
        }
    }

    Ok(())
}

fn run_local(file: &Path, theme: &str, format: OutputFormat) -> Result<()> {
    if !file.is_file() {
        eyre::bail!("video file not found: {}", file.display());
    }
    let total = render::probe_duration(file).wrap_err("error processing video")?;
    info!("Video duration: {total} seconds");

    let suggestions = Suggestions {
        video_id: None,
        file: Some(file.display().to_string()),
        language_code: None,
        language_name: None,
        selection: moments::Tier::Position,
        gif_suggestions: render::local_moments(total, theme),
    };

    let rendered = match format {
        OutputFormat::Text => output::render_text(&suggestions),
        OutputFormat::Json => output::render_json(&suggestions),
    };
    println!("{rendered}");
    Ok(())
}

async fn run_gif(client: &reqwest::Client, config: &Config, args: GifArgs) -> Result<()> {
    let video_path = match (&args.file, &args.video) {
        (Some(file), _) => {
            if !file.is_file() {
                eyre::bail!("video file not found: {}", file.display());
            }
            file.clone()
        }
        (None, Some(url)) => {
            let video_id = youtube::extract_video_id(url)?;
            youtube::download_video(&video_id, &config.download_dir()).wrap_err(
                "failed to download YouTube video; download it manually and pass it with --file instead",
            )?
        }
        (None, None) => eyre::bail!("either --file or --video is required"),
    };

    let caption = if args.translate && !args.caption.trim().is_empty() {
        match analyze::translate(client, &args.caption, "English", config.gemini_model()).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation failed, keeping original caption: {e}");
                args.caption.clone()
            }
        }
    } else {
        args.caption.clone()
    };

    let out = args.out.clone().unwrap_or_else(|| new_gif_path(config));
    let gif = render::create_gif(&video_path, args.start, args.duration, &caption, &out, &GifSettings::default())?;
    println!("{}", gif.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {e}");
        Config::default()
    });

    if cli.verbose {
        let config_path = gifclip::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let client = reqwest::Client::new();

    match cli.command {
        Command::Languages { url, provider, format } => {
            let video_id = youtube::extract_video_id(&url)?;
            let provider = resolve_provider(provider, &config);
            let languages = list_languages(&client, &config, provider, &video_id).await?;
            let rendered = match format {
                OutputFormat::Text => output::render_languages(&languages),
                OutputFormat::Json => output::render_json(&languages),
            };
            println!("{rendered}");
        }
        Command::Moments(args) => run_moments(&client, &config, args, cli.verbose).await?,
        Command::Local { file, theme, format } => run_local(&file, &theme, format)?,
        Command::Gif(args) => run_gif(&client, &config, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_provider_prefers_flag() {
        let config = Config {
            default_provider: Some("rapidapi".to_string()),
            ..Config::default()
        };
        assert_eq!(resolve_provider(Some(Provider::Caption), &config), Provider::Caption);
        assert_eq!(resolve_provider(None, &config), Provider::Rapidapi);
        assert_eq!(resolve_provider(None, &Config::default()), Provider::Caption);
    }

    #[test]
    fn test_source_for_provider() {
        assert_eq!(source_for(Provider::Caption), TranscriptSource::Caption);
        assert_eq!(source_for(Provider::Rapidapi), TranscriptSource::RapidApi);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result: Result<()> = retry(2, || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(eyre::eyre!("boom")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let result = retry(3, || async { Ok::<_, eyre::Report>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
