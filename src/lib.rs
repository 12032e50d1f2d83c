pub mod analyze;
pub mod cache;
pub mod config;
pub mod locate;
pub mod moments;
pub mod output;
pub mod rapidapi;
pub mod render;
pub mod youtube;

use serde::{Deserialize, Serialize};

/// Duration assumed for a transcript entry whose provider did not report one
pub const DEFAULT_ENTRY_DURATION: f64 = 3.0;

fn default_entry_duration() -> f64 {
    DEFAULT_ENTRY_DURATION
}

/// One timed text segment of a video's spoken content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub start: f64,
    #[serde(default = "default_entry_duration")]
    pub duration: f64,
}

impl TranscriptEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A candidate quote, annotated with why it fits the theme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Moment {
    pub quote: String,
    pub reason: String,
    pub description: String,
}

/// A moment with the timestamp needed to cut a clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedMoment {
    #[serde(flatten)]
    pub moment: Moment,
    pub start_time: f64,
    pub duration: f64,
}

/// Where a transcript came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Caption,
    RapidApi,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Caption => write!(f, "caption"),
            TranscriptSource::RapidApi => write!(f, "rapidapi"),
        }
    }
}

/// Complete transcript for a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub source: TranscriptSource,
    pub entries: Vec<TranscriptEntry>,
}

/// A transcript language offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Language {
    pub language_code: String,
    pub language_name: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-Hant", "Chinese (Traditional)"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("it", "Italian"),
    ("tr", "Turkish"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ta", "Tamil"),
    ("pa", "Punjabi"),
    ("pl", "Polish"),
    ("es-ES", "Spanish (Spain)"),
];

/// Readable name for a language code; unknown codes are upper-cased
pub fn language_name(code: &str) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}
