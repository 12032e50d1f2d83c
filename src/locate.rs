use log::debug;

use crate::{EnrichedMoment, Moment, TranscriptEntry};

/// Longest clip cut for a single moment, in seconds
pub const MAX_CLIP_SECONDS: f64 = 5.0;

/// Transcript position found for a quote
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl From<&TranscriptEntry> for Located {
    fn from(entry: &TranscriptEntry) -> Self {
        Self {
            start: entry.start,
            duration: entry.duration,
            text: entry.text.clone(),
        }
    }
}

/// Find the first entry whose text contains the quote, or is contained by it.
///
/// Matching is case-insensitive. When nothing matches, the first entry is
/// returned; an empty transcript yields `None`.
pub fn locate(transcript: &[TranscriptEntry], quote: &str) -> Option<Located> {
    let quote_lower = quote.to_lowercase();

    let matched = transcript.iter().find(|entry| {
        let text = entry.text.to_lowercase();
        text.contains(&quote_lower) || quote_lower.contains(&text)
    });

    match matched {
        Some(entry) => Some(entry.into()),
        None => {
            let first = transcript.first()?;
            debug!("No transcript match for {quote:?}, defaulting to first entry");
            Some(first.into())
        }
    }
}

/// Attach timestamps to moments, dropping any that cannot be located
pub fn enrich(transcript: &[TranscriptEntry], moments: Vec<Moment>) -> Vec<EnrichedMoment> {
    moments
        .into_iter()
        .filter_map(|moment| {
            let located = locate(transcript, &moment.quote)?;
            Some(EnrichedMoment {
                moment,
                start_time: located.start,
                duration: located.duration.min(MAX_CLIP_SECONDS),
            })
        })
        .collect()
}
