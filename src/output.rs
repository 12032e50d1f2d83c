use serde::Serialize;

use crate::moments::Tier;
use crate::{EnrichedMoment, Language};

/// Suggestions for one video, ready for printing or rendering
#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    pub selection: Tier,
    pub gif_suggestions: Vec<EnrichedMoment>,
}

/// One line per suggestion: time range, quote, then the reason indented
pub fn render_text(suggestions: &Suggestions) -> String {
    if suggestions.gif_suggestions.is_empty() {
        return "No GIF moments found".to_string();
    }

    let source = match (&suggestions.language_name, &suggestions.file) {
        (Some(name), _) => name.clone(),
        (None, Some(_)) => "the uploaded video".to_string(),
        (None, None) => "the video".to_string(),
    };
    let mut out = format!(
        "Found {} potential GIF moments in {source} (via {})\n",
        suggestions.gif_suggestions.len(),
        suggestions.selection
    );
    for (i, m) in suggestions.gif_suggestions.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. [{:.1}s +{:.1}s] \"{}\"\n   {}",
            i + 1,
            m.start_time,
            m.duration,
            m.moment.quote,
            m.moment.reason
        ));
        if !m.moment.description.is_empty() {
            out.push_str(&format!("\n   {}", m.moment.description));
        }
    }
    out
}

pub fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub fn render_languages(languages: &[Language]) -> String {
    languages
        .iter()
        .map(|l| {
            let generated = if l.is_generated { " (auto-generated)" } else { "" };
            format!("{:<8} {}{generated}", l.language_code, l.language_name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Moment;

    fn sample() -> Suggestions {
        Suggestions {
            video_id: Some("test1234567".to_string()),
            file: None,
            language_code: Some("en".to_string()),
            language_name: Some("English".to_string()),
            selection: Tier::Keyword,
            gif_suggestions: vec![EnrichedMoment {
                moment: Moment {
                    quote: "we love cats".to_string(),
                    reason: "Contains keywords related to 'cats'".to_string(),
                    description: "Selected based on keyword matching".to_string(),
                },
                start_time: 12.0,
                duration: 3.5,
            }],
        }
    }

    #[test]
    fn test_render_text() {
        let output = render_text(&sample());
        assert_eq!(
            output,
            "Found 1 potential GIF moments in English (via keyword)\n\n\
             1. [12.0s +3.5s] \"we love cats\"\n   \
             Contains keywords related to 'cats'\n   \
             Selected based on keyword matching"
        );
    }

    #[test]
    fn test_render_text_empty() {
        let mut s = sample();
        s.gif_suggestions.clear();
        assert_eq!(render_text(&s), "No GIF moments found");
    }

    #[test]
    fn test_render_local_file_report() {
        let mut s = sample();
        s.video_id = None;
        s.file = Some("clip.mp4".to_string());
        s.language_code = None;
        s.language_name = None;
        s.selection = Tier::Position;

        assert!(render_text(&s).starts_with("Found 1 potential GIF moments in the uploaded video (via position)"));

        let json: serde_json::Value = serde_json::from_str(&render_json(&s)).unwrap();
        assert_eq!(json["file"], "clip.mp4");
        assert!(json.get("language_code").is_none());
        assert!(json.get("language_name").is_none());
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample())).unwrap();
        assert_eq!(json["video_id"], "test1234567");
        assert_eq!(json["selection"], "keyword");
        assert!(json.get("file").is_none());
        assert_eq!(json["language_code"], "en");
        assert_eq!(json["gif_suggestions"][0]["quote"], "we love cats");
        assert_eq!(json["gif_suggestions"][0]["start_time"], 12.0);
    }

    #[test]
    fn test_render_languages() {
        let languages = vec![
            Language {
                language_code: "en".to_string(),
                language_name: "English".to_string(),
                is_generated: true,
                is_translatable: true,
            },
            Language {
                language_code: "de".to_string(),
                language_name: "German".to_string(),
                is_generated: false,
                is_translatable: true,
            },
        ];
        assert_eq!(
            render_languages(&languages),
            "en       English (auto-generated)\nde       German"
        );
    }
}
