use std::path::{Path, PathBuf};
use std::process::Command;

use eyre::{Result, bail};
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use crate::{Language, Transcript, TranscriptEntry, TranscriptSource, language_name};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// yt-dlp format selector; low resolution keeps GIF rendering fast
const DOWNLOAD_FORMAT: &str = "best[height<=480]/best";

const VIDEO_ID_PATTERNS: &[&str] = &[
    r"^([a-zA-Z0-9_-]{11})$",
    r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]{11})",
    r"youtu\.be/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
];

/// Extract the video ID from a YouTube URL or a bare ID
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    for pattern in VIDEO_ID_PATTERNS {
        if let Some(caps) = Regex::new(pattern)?.captures(input) {
            let video_id = caps[1].to_string();
            debug!("Extracted video ID {video_id} from {input}");
            return Ok(video_id);
        }
    }
    bail!(
        "invalid YouTube URL: {input}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  <11-character video ID>"
    );
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    /// "asr" for auto-generated tracks
    kind: Option<String>,
}

struct PlayerInfo {
    title: String,
    tracks: Vec<CaptionTrack>,
}

async fn fetch_player(client: &reqwest::Client, video_id: &str, lang: &str) -> Result<PlayerInfo> {
    let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
    debug!("Fetching watch page: {watch_url}");

    let page_html = client
        .get(&watch_url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let api_key = extract_api_key(&page_html)?;
    debug!("Extracted InnerTube API key: {api_key}");

    let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

    let body = serde_json::json!({
        "context": {
            "client": {
                "hl": lang,
                "gl": "US",
                "clientName": "WEB",
                "clientVersion": "2.20241126.01.00"
            }
        },
        "videoId": video_id
    });

    let resp: InnerTubePlayerResponse = client
        .post(&player_url)
        .header("User-Agent", USER_AGENT)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let title = resp
        .video_details
        .and_then(|vd| vd.title)
        .unwrap_or_default();

    let tracks = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    Ok(PlayerInfo { title, tracks })
}

/// Caption languages offered for a video
pub async fn list_languages(client: &reqwest::Client, video_id: &str) -> Result<Vec<Language>> {
    let player = fetch_player(client, video_id, "en").await?;
    if player.tracks.is_empty() {
        bail!("no captions available for video {video_id}");
    }
    let languages = tracks_to_languages(&player.tracks);
    info!("Found {} caption languages for {video_id}", languages.len());
    Ok(languages)
}

fn tracks_to_languages(tracks: &[CaptionTrack]) -> Vec<Language> {
    tracks
        .iter()
        .map(|t| Language {
            language_code: t.language_code.clone(),
            language_name: language_name(&t.language_code),
            is_generated: t.kind.as_deref() == Some("asr"),
            is_translatable: true,
        })
        .collect()
}

/// Fetch a transcript from YouTube's built-in captions via the InnerTube API
pub async fn fetch_captions(client: &reqwest::Client, video_id: &str, lang: &str) -> Result<Transcript> {
    let player = fetch_player(client, video_id, lang).await?;

    // Requested language first, otherwise whatever the video has
    let Some(track) = player
        .tracks
        .iter()
        .find(|t| t.language_code == lang)
        .or_else(|| player.tracks.first())
    else {
        bail!("no captions available for video {video_id}");
    };

    let actual_lang = track.language_code.clone();
    debug!("Using caption track: lang={actual_lang}");

    let caption_xml = client
        .get(&track.base_url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let entries = parse_caption_xml(&caption_xml)?;
    info!("Fetched {} caption entries for {video_id}", entries.len());

    Ok(Transcript {
        video_id: video_id.to_string(),
        title: player.title,
        language: actual_lang,
        source: TranscriptSource::Caption,
        entries,
    })
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

fn parse_caption_xml(xml: &str) -> Result<Vec<TranscriptEntry>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current_start = None;
                current_dur = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                    match attr.key.as_ref() {
                        b"start" => current_start = value,
                        b"dur" => current_dur = value,
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(start) = current_start.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        entries.push(TranscriptEntry {
                            text,
                            start,
                            duration: current_dur.take().unwrap_or(crate::DEFAULT_ENTRY_DURATION),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(entries)
}

/// Path of an earlier download of `video_id` in `dir`, if any
pub fn find_download(dir: &Path, video_id: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .find(|p| p.is_file() && p.file_stem().is_some_and(|s| s == video_id))
}

/// Download a video with yt-dlp into `dir`, reusing an earlier download
pub fn download_video(video_id: &str, dir: &Path) -> Result<PathBuf> {
    if let Some(existing) = find_download(dir, video_id) {
        info!("Video already downloaded: {}", existing.display());
        return Ok(existing);
    }

    std::fs::create_dir_all(dir)?;
    let url = format!("https://www.youtube.com/watch?v={video_id}");
    let output_template = dir.join(format!("{video_id}.%(ext)s"));
    info!("Downloading video via yt-dlp: {url}");

    let output = Command::new("yt-dlp")
        .args(["-f", DOWNLOAD_FORMAT, "--no-playlist", "--quiet", "--no-warnings", "-o"])
        .arg(&output_template)
        .arg(&url)
        .output();

    match output {
        Ok(o) if o.status.success() => {}
        Ok(o) => bail!(
            "yt-dlp exited with status {}: {}\n\nThe video may be private, region-locked or copyright restricted. \
             Download it manually and use `gifclip gif --file <PATH>` instead.",
            o.status,
            String::from_utf8_lossy(&o.stderr).trim()
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!(
                "yt-dlp not found. Install it to render YouTube videos:\n  \
                 pip install yt-dlp\n  \
                 or: brew install yt-dlp"
            );
        }
        Err(e) => bail!("failed to run yt-dlp: {e}"),
    }

    match find_download(dir, video_id) {
        Some(path) => {
            info!("Downloaded {}", path.display());
            Ok(path)
        }
        None => bail!("yt-dlp finished but no file for {video_id} appeared in {}", dir.display()),
    }
}
