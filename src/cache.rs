use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;

use crate::{Transcript, TranscriptSource};

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("gifclip")
        .join("transcripts")
}

fn cache_path(dir: &Path, video_id: &str, lang: &str, source: TranscriptSource) -> PathBuf {
    dir.join(format!("{video_id}-{lang}-{source}.json"))
}

/// Load a cached transcript, if available.
pub fn load(dir: &Path, video_id: &str, lang: &str, source: TranscriptSource) -> Option<Transcript> {
    let path = cache_path(dir, video_id, lang, source);
    let data = std::fs::read_to_string(&path).ok()?;
    let transcript: Transcript = serde_json::from_str(&data).ok()?;
    debug!("Cache hit: {}", path.display());
    Some(transcript)
}

/// Save a transcript under the language it was requested in.
pub fn save(dir: &Path, transcript: &Transcript, requested_lang: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = cache_path(dir, &transcript.video_id, requested_lang, transcript.source);
    let data = serde_json::to_string_pretty(transcript)?;
    std::fs::write(&path, data)?;
    debug!("Cached transcript: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranscriptEntry;

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("gifclip-cache-{}", uuid::Uuid::new_v4()));
        let transcript = Transcript {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Test".to_string(),
            language: "en".to_string(),
            source: TranscriptSource::RapidApi,
            entries: vec![TranscriptEntry::new("hello", 0.0, 1.0)],
        };

        assert!(load(&dir, "dQw4w9WgXcQ", "en", TranscriptSource::RapidApi).is_none());
        save(&dir, &transcript, "en").unwrap();

        let loaded = load(&dir, "dQw4w9WgXcQ", "en", TranscriptSource::RapidApi).unwrap();
        assert_eq!(loaded.entries, transcript.entries);
        assert!(load(&dir, "dQw4w9WgXcQ", "en", TranscriptSource::Caption).is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
