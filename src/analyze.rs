use eyre::{Result, bail};
use log::{debug, info};
use regex::Regex;

use crate::TranscriptEntry;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Transcript text sent for analysis is cut to this many characters
const MAX_PROMPT_TRANSCRIPT_CHARS: usize = 2000;

/// Ask the LLM for theme-matching moments.
///
/// Returns the JSON mapping found in the reply; the caller decides whether it
/// holds anything usable.
pub async fn find_moments(
    client: &reqwest::Client,
    transcript: &[TranscriptEntry],
    theme: &str,
    language_name: &str,
    model: &str,
) -> Result<serde_json::Value> {
    let prompt = build_moments_prompt(transcript, theme, language_name);
    let reply = generate(client, &prompt, model).await?;
    debug!("Gemini reply: {}", truncate_chars(&reply, 200));
    extract_json(&reply)
}

/// Translate `text` into `target_language`
pub async fn translate(client: &reqwest::Client, text: &str, target_language: &str, model: &str) -> Result<String> {
    let prompt = format!("Translate this text to {target_language}. Only return the translated text, nothing else: {text}");
    let translated = generate(client, &prompt, model).await?.trim().to_string();
    if translated.is_empty() {
        bail!("empty translation returned");
    }
    info!("Translated caption: {}", truncate_chars(&translated, 100));
    Ok(translated)
}

fn build_moments_prompt(transcript: &[TranscriptEntry], theme: &str, language_name: &str) -> String {
    let full_text = transcript
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    debug!("Analyzing transcript with {} characters", full_text.chars().count());

    let excerpt = if full_text.chars().count() > MAX_PROMPT_TRANSCRIPT_CHARS {
        format!("{}...", truncate_chars(&full_text, MAX_PROMPT_TRANSCRIPT_CHARS))
    } else {
        full_text
    };

    let language_note = if language_name == "English" {
        String::new()
    } else {
        format!("Note: The transcript is in {language_name}.\n")
    };

    format!(
        r#"Analyze this video transcript and the user's theme prompt to find 2-3 key moments that would make great GIFs.
{language_note}
User's theme: {theme}

Transcript: {excerpt}

Please identify 2-3 specific quotes/moments that match the theme. For each moment, provide:
1. The exact text/quote from the transcript (keep in original language)
2. Why it fits the theme
3. A brief description of what makes it GIF-worthy

Format your response as JSON with this structure:
{{
    "moments": [
        {{
            "quote": "exact quote from transcript in original language",
            "reason": "why it fits the theme",
            "description": "what makes it GIF-worthy"
        }}
    ]
}}"#
    )
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pull the outermost `{...}` object out of an LLM reply and parse it
fn extract_json(reply: &str) -> Result<serde_json::Value> {
    let re = Regex::new(r"(?s)\{.*\}")?;
    let Some(m) = re.find(reply) else {
        bail!("no JSON object found in Gemini reply");
    };
    serde_json::from_str(m.as_str()).map_err(|e| eyre::eyre!("failed to parse Gemini JSON: {e}"))
}

async fn generate(client: &reqwest::Client, prompt: &str, model: &str) -> Result<String> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| eyre::eyre!("GEMINI_API_KEY environment variable not set (required for Gemini analysis)"))?;

    debug!("Calling Gemini model {model}");

    let body = serde_json::json!({
        "contents": [
            {
                "parts": [
                    { "text": prompt }
                ]
            }
        ]
    });

    let resp = client
        .post(format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        ))
        .header("x-goog-api-key", &api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Gemini API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_gemini_text(&json)
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Gemini API response format");
}
