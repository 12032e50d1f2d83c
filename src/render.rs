use std::path::{Path, PathBuf};
use std::process::Command;

use eyre::{Result, WrapErr, bail};
use log::{debug, info, warn};

use crate::locate::MAX_CLIP_SECONDS;
use crate::{EnrichedMoment, Moment};

/// Output geometry and caption layout for a rendered GIF
#[derive(Debug, Clone)]
pub struct GifSettings {
    pub width: u32,
    pub fps: u32,
    pub font_size: u32,
    pub max_chars_per_line: usize,
    pub max_lines: usize,
    pub bottom_margin: u32,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            width: 480,
            fps: 10,
            font_size: 16,
            max_chars_per_line: 30,
            max_lines: 3,
            bottom_margin: 20,
        }
    }
}

/// Greedy word wrap, keeping at most `max_lines` lines
pub fn wrap_caption(caption: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in caption.split_whitespace() {
        if current.chars().count() + 1 + word.chars().count() <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(max_lines);
    lines
}

/// Single-quote a value for an ffmpeg filter option; embedded quotes close and reopen it
fn quote_filter_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Build the `-filter_complex` graph; `caption_file` enables the text overlay
pub fn build_filter(settings: &GifSettings, caption_file: Option<&Path>) -> String {
    let mut chain = format!(
        "fps={},scale={}:-1:flags=lanczos",
        settings.fps, settings.width
    );
    if let Some(path) = caption_file {
        chain.push_str(&format!(
            ",drawtext=textfile={}:fontcolor=white:fontsize={}:borderw=2:bordercolor=black:\
             line_spacing=4:x=(w-text_w)/2:y=h-text_h-{}",
            quote_filter_value(&path.to_string_lossy()),
            settings.font_size,
            settings.bottom_margin
        ));
    }
    format!("[0:v]{chain},split[a][b];[a]palettegen[p];[b][p]paletteuse")
}

fn run_ffmpeg(input: &Path, start: f64, duration: f64, filter: &str, output: &Path) -> Result<()> {
    let result = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(["-ss", &format!("{start:.3}"), "-t", &format!("{duration:.3}")])
        .arg("-i")
        .arg(input)
        .args(["-filter_complex", filter, "-loop", "0"])
        .arg(output)
        .output();

    match result {
        Ok(o) if o.status.success() => Ok(()),
        Ok(o) => bail!(
            "ffmpeg exited with status {}: {}",
            o.status,
            String::from_utf8_lossy(&o.stderr).trim()
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!("ffmpeg not found. Install it to render GIFs:\n  apt install ffmpeg\n  or: brew install ffmpeg")
        }
        Err(e) => bail!("failed to run ffmpeg: {e}"),
    }
}

/// Cut `duration` seconds from `start` and encode a captioned GIF.
///
/// A failed captioned render is retried once without text.
pub fn create_gif(
    input: &Path,
    start: f64,
    duration: f64,
    caption: &str,
    output: &Path,
    settings: &GifSettings,
) -> Result<PathBuf> {
    if duration <= 0.0 {
        bail!("clip duration must be positive, got {duration}");
    }
    if start < 0.0 {
        bail!("clip start must not be negative, got {start}");
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(
        "Creating GIF from {} at {start}s for {duration}s",
        input.display()
    );

    let lines = wrap_caption(caption, settings.max_chars_per_line, settings.max_lines);
    if !lines.is_empty() {
        let caption_file = std::env::temp_dir().join(format!("gifclip-caption-{}.txt", uuid::Uuid::new_v4()));
        std::fs::write(&caption_file, lines.join("\n"))?;
        debug!("Caption lines: {lines:?}");

        let filter = build_filter(settings, Some(&caption_file));
        let captioned = run_ffmpeg(input, start, duration, &filter, output);
        let _ = std::fs::remove_file(&caption_file);

        match captioned {
            Ok(()) => {
                info!("GIF with caption created: {}", output.display());
                return Ok(output.to_path_buf());
            }
            Err(e) => warn!("Text overlay failed: {e}, creating GIF without text"),
        }
    }

    run_ffmpeg(input, start, duration, &build_filter(settings, None), output)
        .wrap_err_with(|| format!("error creating GIF {}", output.display()))?;
    info!("GIF created: {}", output.display());
    Ok(output.to_path_buf())
}

/// Container duration of a media file, in seconds
pub fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .wrap_err("failed to run ffprobe (is ffmpeg installed?)")?;

    if !output.status.success() {
        bail!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration: f64 = stdout
        .trim()
        .parse()
        .wrap_err_with(|| format!("unexpected ffprobe output: {stdout:?}"))?;
    debug!("Probed {}: {duration}s", path.display());
    Ok(duration)
}

/// Evenly spaced moments for a video with no transcript
pub fn local_moments(total_duration: f64, theme: &str) -> Vec<EnrichedMoment> {
    if total_duration <= 0.0 {
        return Vec::new();
    }

    let count = ((total_duration / 10.0).floor() as usize).clamp(1, 3);
    let span = total_duration / count as f64;

    (0..count)
        .map(|i| {
            let start_time = i as f64 * span;
            EnrichedMoment {
                moment: Moment {
                    quote: format!("Moment {} from uploaded video - {theme}", i + 1),
                    reason: format!("Matches theme: {theme}"),
                    description: format!("Sample moment at {start_time:.1}s"),
                },
                start_time,
                duration: MAX_CLIP_SECONDS.min(total_duration - start_time).min(span),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_caption_short() {
        assert_eq!(wrap_caption("hello world", 30, 3), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_caption_breaks_lines() {
        let lines = wrap_caption("the quick brown fox jumps over the lazy dog again", 20, 3);
        assert_eq!(lines, vec!["the quick brown fox", "jumps over the lazy", "dog again"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn test_wrap_caption_limits_lines() {
        let caption = "one two three four five six seven eight nine ten eleven twelve";
        let lines = wrap_caption(caption, 10, 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "one two");
    }

    #[test]
    fn test_wrap_caption_overlong_word_gets_own_line() {
        let lines = wrap_caption("a supercalifragilisticexpialidocious word", 10, 3);
        assert_eq!(lines, vec!["a", "supercalifragilisticexpialidocious", "word"]);
    }

    #[test]
    fn test_wrap_caption_blank() {
        assert!(wrap_caption("   ", 30, 3).is_empty());
    }

    #[test]
    fn test_build_filter_without_caption() {
        let filter = build_filter(&GifSettings::default(), None);
        assert_eq!(
            filter,
            "[0:v]fps=10,scale=480:-1:flags=lanczos,split[a][b];[a]palettegen[p];[b][p]paletteuse"
        );
    }

    #[test]
    fn test_build_filter_with_caption() {
        let filter = build_filter(&GifSettings::default(), Some(Path::new("/tmp/caption.txt")));
        assert!(filter.contains("drawtext=textfile='/tmp/caption.txt':"));
        assert!(filter.contains("fontsize=16"));
        assert!(filter.contains("y=h-text_h-20"));
        assert!(filter.ends_with("paletteuse"));
    }

    #[test]
    fn test_build_filter_quotes_apostrophes_in_path() {
        let filter = build_filter(&GifSettings::default(), Some(Path::new("/tmp/it's.txt")));
        assert!(filter.contains(r"drawtext=textfile='/tmp/it'\''s.txt':fontcolor"));
    }

    #[test]
    fn test_create_gif_rejects_bad_ranges() {
        let out = std::env::temp_dir().join("gifclip-never-written.gif");
        assert!(create_gif(Path::new("in.mp4"), 0.0, 0.0, "", &out, &GifSettings::default()).is_err());
        assert!(create_gif(Path::new("in.mp4"), -1.0, 2.0, "", &out, &GifSettings::default()).is_err());
    }

    #[test]
    fn test_local_moments_short_video() {
        let moments = local_moments(8.0, "cats");
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].start_time, 0.0);
        assert_eq!(moments[0].duration, 5.0);
        assert_eq!(moments[0].moment.quote, "Moment 1 from uploaded video - cats");
    }

    #[test]
    fn test_local_moments_long_video() {
        let moments = local_moments(120.0, "dogs");
        assert_eq!(moments.len(), 3);
        let starts: Vec<f64> = moments.iter().map(|m| m.start_time).collect();
        assert_eq!(starts, vec![0.0, 40.0, 80.0]);
        assert!(moments.iter().all(|m| m.duration <= MAX_CLIP_SECONDS));
        assert_eq!(moments[1].moment.description, "Sample moment at 40.0s");
    }

    #[test]
    fn test_local_moments_tiny_span() {
        let moments = local_moments(25.0, "x");
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[1].start_time, 12.5);
        assert_eq!(moments[1].duration, 5.0);
    }

    #[test]
    fn test_local_moments_empty_video() {
        assert!(local_moments(0.0, "x").is_empty());
    }
}
