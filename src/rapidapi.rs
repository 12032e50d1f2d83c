use eyre::{Result, bail};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::{DEFAULT_ENTRY_DURATION, Language, Transcript, TranscriptEntry, TranscriptSource, language_name};

pub const DEFAULT_HOST: &str = "youtube-transcriptor.p.rapidapi.com";

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "availableLangs", default)]
    available_langs: Vec<String>,
    #[serde(default)]
    transcription: Vec<TranscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionItem {
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    start: f64,
    #[serde(default = "default_dur")]
    dur: f64,
}

fn default_dur() -> f64 {
    DEFAULT_ENTRY_DURATION
}

fn api_key() -> Result<String> {
    std::env::var("RAPIDAPI_KEY")
        .map_err(|_| eyre::eyre!("RAPIDAPI_KEY environment variable not set (required for the rapidapi provider)"))
}

async fn request(client: &reqwest::Client, host: &str, video_id: &str, lang: &str) -> Result<VideoInfo> {
    let api_key = api_key()?;
    let url = format!("https://{host}/transcript");
    debug!("Requesting {url}?video_id={video_id}&lang={lang}");

    let resp = client
        .get(&url)
        .query(&[("video_id", video_id), ("lang", lang)])
        .header("x-rapidapi-key", &api_key)
        .header("x-rapidapi-host", host)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    debug!("RapidAPI responded {status} with {} bytes", body.len());

    if !status.is_success() {
        error!("RapidAPI error body: {body}");
        bail!("RapidAPI request failed with status {status}: {body}");
    }
    if body.trim().is_empty() {
        bail!("empty response from transcript service");
    }

    let json: Value = serde_json::from_str(&body)
        .map_err(|e| eyre::eyre!("invalid JSON response from transcript service: {e}"))?;
    parse_video_info(json, video_id)
}

fn parse_video_info(json: Value, video_id: &str) -> Result<VideoInfo> {
    let info = match json {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => bail!("no transcript data found for video {video_id}"),
        },
        Value::Object(ref map) if map.is_empty() => bail!("no transcript data found for video {video_id}"),
        Value::Null => bail!("no transcript data found for video {video_id}"),
        other => other,
    };
    Ok(serde_json::from_value(info)?)
}

/// Transcript languages the service reports for a video
pub async fn list_languages(client: &reqwest::Client, host: &str, video_id: &str) -> Result<Vec<Language>> {
    let info = request(client, host, video_id, "en").await?;
    let languages = languages_from(info.available_langs);
    info!("Found {} available languages for {video_id}", languages.len());
    Ok(languages)
}

fn languages_from(codes: Vec<String>) -> Vec<Language> {
    let codes = if codes.is_empty() {
        warn!("No availableLangs in response, assuming English");
        vec!["en".to_string()]
    } else {
        codes
    };

    codes
        .into_iter()
        .map(|code| Language {
            language_name: language_name(&code),
            language_code: code,
            is_generated: true,
            is_translatable: true,
        })
        .collect()
}

/// Fetch the transcript for `video_id` in `lang`
pub async fn fetch_transcript(client: &reqwest::Client, host: &str, video_id: &str, lang: &str) -> Result<Transcript> {
    let info = request(client, host, video_id, lang).await?;
    transcript_from(info, video_id, lang)
}

fn transcript_from(info: VideoInfo, video_id: &str, lang: &str) -> Result<Transcript> {
    if info.transcription.is_empty() {
        bail!("no transcription data available for video {video_id} in {lang}");
    }

    let entries: Vec<TranscriptEntry> = info
        .transcription
        .into_iter()
        .map(|item| TranscriptEntry {
            text: item.subtitle,
            start: item.start,
            duration: item.dur,
        })
        .collect();

    info!("Retrieved transcript with {} entries", entries.len());
    Ok(Transcript {
        video_id: video_id.to_string(),
        title: info.title.unwrap_or_default(),
        language: lang.to_string(),
        source: TranscriptSource::RapidApi,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_response() {
        let json = serde_json::json!([{
            "title": "Demo",
            "availableLangs": ["en", "hi"],
            "transcription": [
                {"subtitle": "hello there", "start": 0.5, "dur": 2.0},
                {"subtitle": "general kenobi", "start": 2.5}
            ]
        }]);
        let info = parse_video_info(json, "abc").unwrap();
        assert_eq!(info.available_langs, vec!["en", "hi"]);

        let transcript = transcript_from(info, "abc", "en").unwrap();
        assert_eq!(transcript.title, "Demo");
        assert_eq!(transcript.source, TranscriptSource::RapidApi);
        assert_eq!(transcript.entries.len(), 2);
        assert_eq!(transcript.entries[0], TranscriptEntry::new("hello there", 0.5, 2.0));
        assert_eq!(transcript.entries[1].duration, DEFAULT_ENTRY_DURATION);
    }

    #[test]
    fn test_parse_object_response() {
        let json = serde_json::json!({"transcription": [{"subtitle": "hi"}]});
        let info = parse_video_info(json, "abc").unwrap();
        let transcript = transcript_from(info, "abc", "fr").unwrap();
        assert_eq!(transcript.entries[0].start, 0.0);
        assert_eq!(transcript.language, "fr");
    }

    #[test]
    fn test_empty_responses_are_errors() {
        assert!(parse_video_info(serde_json::json!([]), "abc").is_err());
        assert!(parse_video_info(serde_json::json!({}), "abc").is_err());
        assert!(parse_video_info(Value::Null, "abc").is_err());
    }

    #[test]
    fn test_missing_transcription_is_error() {
        let info = parse_video_info(serde_json::json!({"title": "x"}), "abc").unwrap();
        assert!(transcript_from(info, "abc", "en").is_err());
    }

    #[test]
    fn test_languages_default_to_english() {
        let languages = languages_from(vec![]);
        assert_eq!(languages.len(), 1);
        assert_eq!(languages[0].language_code, "en");
        assert_eq!(languages[0].language_name, "English");
        assert!(languages[0].is_generated);
    }

    #[test]
    fn test_languages_names() {
        let languages = languages_from(vec!["zh-CN".to_string(), "xx".to_string()]);
        assert_eq!(languages[0].language_name, "Chinese (Simplified)");
        assert_eq!(languages[1].language_name, "XX");
    }
}
