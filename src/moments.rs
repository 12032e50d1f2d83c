use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::{Moment, TranscriptEntry};

/// Upper bound on moments returned by any tier
pub const MAX_MOMENTS: usize = 3;

/// Only the opening entries are scanned for keywords
pub const KEYWORD_SCAN_LIMIT: usize = 20;

/// The tier that produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Analysis,
    Keyword,
    Position,
    None,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Analysis => write!(f, "analysis"),
            Tier::Keyword => write!(f, "keyword"),
            Tier::Position => write!(f, "position"),
            Tier::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub tier: Tier,
    pub moments: Vec<Moment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Beginning,
    Middle,
    End,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Beginning => write!(f, "beginning"),
            Position::Middle => write!(f, "middle"),
            Position::End => write!(f, "end"),
        }
    }
}

type Strategy<'a> = (Tier, Box<dyn FnOnce() -> Option<Vec<Moment>> + 'a>);

fn strategy<'a>(tier: Tier, run: impl FnOnce() -> Option<Vec<Moment>> + 'a) -> Strategy<'a> {
    (tier, Box::new(run))
}

/// Run strategies in order; the first non-empty result wins
fn first_success(strategies: Vec<Strategy<'_>>) -> Selection {
    strategies
        .into_iter()
        .find_map(|(tier, run)| {
            run()
                .filter(|moments| !moments.is_empty())
                .map(|moments| Selection { tier, moments })
        })
        .unwrap_or(Selection {
            tier: Tier::None,
            moments: Vec::new(),
        })
}

/// Select moments for `theme`, preferring a usable analysis result.
///
/// Tiers run in order and the first that yields anything wins: the analysis
/// result, keyword matches in the opening entries, then positional samples.
/// An empty transcript always selects nothing.
pub fn select(transcript: &[TranscriptEntry], theme: &str, analysis: Option<&Value>) -> Selection {
    if transcript.is_empty() {
        debug!("Empty transcript, nothing to select");
        return Selection {
            tier: Tier::None,
            moments: Vec::new(),
        };
    }

    let selection = first_success(vec![
        strategy(Tier::Analysis, move || analysis.and_then(from_analysis)),
        strategy(Tier::Keyword, || keyword_moments(transcript, theme)),
        strategy(Tier::Position, || positional_moments(transcript, theme)),
    ]);
    info!("Selected {} moments via {}", selection.moments.len(), selection.tier);
    selection
}

/// Local selection used when no analysis is available
pub fn fallback(transcript: &[TranscriptEntry], theme: &str) -> Vec<Moment> {
    select(transcript, theme, None).moments
}

/// Usable moments from an analysis mapping: elements need a non-blank string `quote`
pub fn from_analysis(analysis: &Value) -> Option<Vec<Moment>> {
    let Some(items) = analysis.get("moments").and_then(|m| m.as_array()) else {
        debug!("Analysis result has no moments list");
        return None;
    };

    let text = |item: &Value, key: &str| {
        item.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let moments: Vec<Moment> = items
        .iter()
        .filter_map(|item| {
            let quote = item.get("quote")?.as_str()?.trim();
            if quote.is_empty() {
                return None;
            }
            Some(Moment {
                quote: quote.to_string(),
                reason: text(item, "reason"),
                description: text(item, "description"),
            })
        })
        .take(MAX_MOMENTS)
        .collect();

    debug!("Analysis offered {} items, {} usable", items.len(), moments.len());
    Some(moments)
}

fn keyword_moments(transcript: &[TranscriptEntry], theme: &str) -> Option<Vec<Moment>> {
    let lowered = theme.to_lowercase();
    let keywords: Vec<&str> = lowered.split_whitespace().collect();
    if keywords.is_empty() {
        return None;
    }

    let moments: Vec<Moment> = transcript
        .iter()
        .take(KEYWORD_SCAN_LIMIT)
        .filter(|entry| {
            let text = entry.text.to_lowercase();
            keywords.iter().any(|k| text.contains(k))
        })
        .take(MAX_MOMENTS)
        .map(|entry| Moment {
            quote: entry.text.clone(),
            reason: format!("Contains keywords related to '{theme}'"),
            description: "Selected based on keyword matching".to_string(),
        })
        .collect();

    debug!("Keyword scan found {} moments", moments.len());
    Some(moments)
}

fn positional_moments(transcript: &[TranscriptEntry], theme: &str) -> Option<Vec<Moment>> {
    let n = transcript.len();
    if n == 0 {
        return None;
    }

    let mut picks = vec![(Position::Beginning, 0)];
    if n > 1 {
        picks.push((Position::Middle, n / 2));
    }
    if n > 2 {
        picks.push((Position::End, n - 1));
    }

    Some(
        picks
            .into_iter()
            .map(|(position, idx)| Moment {
                quote: transcript[idx].text.clone(),
                reason: format!("Sample moment from video ({position})"),
                description: format!("Selected from video {position} - matches theme: {theme}"),
            })
            .collect(),
    )
}
