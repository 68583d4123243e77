//! Cumulative renderer
//!
//! Turns an ordered segment list into one reveal frame per segment. Each frame
//! holds the text accumulated so far and a highlighted fragment where the part
//! contributed by the current segment is marked as new.
//!
//! New content is found by slicing the current cumulative field past the
//! character length of the previous segment's cumulative field. This assumes
//! the model returned growing prefixes; nothing here checks or repairs that,
//! so out-of-order fields produce odd (but never panicking) output.

use crate::segment::Segment;

/// Glyph inserted between segments in separator mode
pub const SEPARATOR: &str = "/";

/// Accumulated text with the newest part split out for highlighting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Text shown unmarked before the new part
    pub prefix: String,
    /// Whitespace or separator sitting between prefix and new part
    pub lead: String,
    /// Content added by the current segment
    pub new: String,
}

impl Highlight {
    /// Render with the new part wrapped in `<new>` markers
    pub fn to_markup(&self) -> String {
        format!("{}{}<new>{}</new>", self.prefix, self.lead, self.new)
    }

    /// Lead plus new part, without markers
    pub fn contribution(&self) -> String {
        format!("{}{}", self.lead, self.new)
    }
}

/// Everything displayed for segment `index`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealFrame {
    pub index: usize,
    pub accumulated_jp: String,
    pub accumulated_kr: String,
    pub accumulated_translation: String,
    /// Word meanings so far, joined by a space (or the separator)
    pub meanings: String,
    pub jp: Highlight,
    pub kr: Highlight,
    pub translation: Highlight,
}

/// End-of-sentence view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub jp: String,
    /// Every segment's own reading, joined with `/`
    pub reading: String,
    pub kr: String,
    pub translation: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativeRenderer {
    separator: bool,
}

impl CumulativeRenderer {
    pub fn new(separator: bool) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> bool {
        self.separator
    }

    /// Build one frame per segment
    pub fn render(&self, segments: &[Segment]) -> Vec<RevealFrame> {
        let mut frames: Vec<RevealFrame> = Vec::with_capacity(segments.len());

        for (idx, item) in segments.iter().enumerate() {
            let frame = match frames.last() {
                None => RevealFrame {
                    index: 0,
                    accumulated_jp: item.cumulative_jp.clone(),
                    accumulated_kr: item.cumulative_kr.clone(),
                    accumulated_translation: item.cumulative_translation.clone(),
                    meanings: item.meaning.clone(),
                    jp: Highlight {
                        new: item.cumulative_jp.clone(),
                        ..Default::default()
                    },
                    kr: Highlight {
                        new: item.cumulative_kr.clone(),
                        ..Default::default()
                    },
                    translation: Highlight {
                        new: item.cumulative_translation.clone(),
                        ..Default::default()
                    },
                },
                Some(prev_frame) => {
                    let prev = &segments[idx - 1];
                    let jp = self.highlight_jp(&segments[..idx], prev, item);
                    let kr = spaced_highlight(&prev.cumulative_kr, &item.cumulative_kr);
                    let translation = spaced_highlight(
                        &prev.cumulative_translation,
                        &item.cumulative_translation,
                    );

                    let meaning_glue = if self.separator { SEPARATOR } else { " " };
                    RevealFrame {
                        index: idx,
                        accumulated_jp: format!("{}{}", prev_frame.accumulated_jp, jp.contribution()),
                        accumulated_kr: format!("{}{}", prev_frame.accumulated_kr, kr.contribution()),
                        accumulated_translation: format!(
                            "{}{}",
                            prev_frame.accumulated_translation,
                            translation.contribution()
                        ),
                        meanings: format!("{}{}{}", prev_frame.meanings, meaning_glue, item.meaning),
                        jp,
                        kr,
                        translation,
                    }
                }
            };
            frames.push(frame);
        }

        frames
    }

    /// Japanese highlight. In separator mode the prefix is rebuilt from every
    /// earlier segment's own `jp` joined by the separator, not taken from the
    /// cumulative field.
    fn highlight_jp(&self, earlier: &[Segment], prev: &Segment, item: &Segment) -> Highlight {
        let new = suffix_delta(&prev.cumulative_jp, &item.cumulative_jp).to_string();
        if self.separator {
            let prefix = earlier
                .iter()
                .map(|s| s.jp.as_str())
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            Highlight {
                prefix,
                lead: SEPARATOR.to_string(),
                new,
            }
        } else {
            Highlight {
                prefix: prev.cumulative_jp.clone(),
                lead: String::new(),
                new,
            }
        }
    }

    /// Final cumulative strings plus the slash-joined per-segment readings
    pub fn summary(&self, segments: &[Segment]) -> Option<Summary> {
        let last = segments.last()?;
        Some(Summary {
            jp: last.cumulative_jp.clone(),
            reading: segments
                .iter()
                .map(|s| s.read.as_str())
                .collect::<Vec<_>>()
                .join("/"),
            kr: last.cumulative_kr.clone(),
            translation: last.cumulative_translation.clone(),
        })
    }
}

/// Part of `current` past the character length of `previous`
pub fn suffix_delta<'a>(previous: &str, current: &'a str) -> &'a str {
    let skip = previous.chars().count();
    match current.char_indices().nth(skip) {
        Some((byte, _)) => &current[byte..],
        None => "",
    }
}

/// Split leading whitespace off a delta: `(spacing, content)`
fn split_leading_whitespace(delta: &str) -> (&str, &str) {
    let content = delta.trim_start();
    (&delta[..delta.len() - content.len()], content)
}

fn spaced_highlight(previous: &str, current: &str) -> Highlight {
    let (spacing, content) = split_leading_whitespace(suffix_delta(previous, current));
    Highlight {
        prefix: previous.to_string(),
        lead: spacing.to_string(),
        new: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(jp: &str, read: &str, meaning: &str, cjp: &str, ckr: &str, ctrans: &str) -> Segment {
        Segment {
            jp: jp.to_string(),
            read: read.to_string(),
            meaning: meaning.to_string(),
            cumulative_jp: cjp.to_string(),
            cumulative_kr: ckr.to_string(),
            cumulative_translation: ctrans.to_string(),
            ..Default::default()
        }
    }

    fn dinner() -> Vec<Segment> {
        vec![
            seg("今日の", "きょうの", "오늘의", "今日の", "쿄-노", "오늘의"),
            seg("晩ご飯は", "ばんごはんは", "저녁밥은", "今日の晩ご飯は", "쿄-노 방고항와", "오늘의 저녁밥은"),
            seg("何を", "なにを", "무엇을", "今日の晩ご飯は何を", "쿄-노 방고항와 나니오", "오늘의 저녁밥은 무엇을"),
            seg(
                "食べようか",
                "たべようか",
                "먹을까",
                "今日の晩ご飯は何を食べようか",
                "쿄-노 방고항와 나니오 타베요-카",
                "오늘의 저녁밥은 무엇을 먹을까",
            ),
        ]
    }

    #[test]
    fn test_suffix_delta() {
        assert_eq!(suffix_delta("쿄-노 방고항와", "쿄-노 방고항와 나니오"), " 나니오");
        assert_eq!(suffix_delta("", "今日の"), "今日の");
        assert_eq!(suffix_delta("今日の", "今日の"), "");
    }

    #[test]
    fn test_korean_delta_keeps_spacing_separate() {
        let segments = dinner();
        let frames = CumulativeRenderer::new(false).render(&segments[..3]);
        let kr = &frames[2].kr;

        assert_eq!(kr.lead, " ");
        assert_eq!(kr.new, "나니오");
        assert_eq!(kr.to_markup(), "쿄-노 방고항와 <new>나니오</new>");
        assert_eq!(frames[2].accumulated_kr, "쿄-노 방고항와 나니오");
    }

    #[test]
    fn test_final_accumulation_matches_last_cumulative() {
        let segments = dinner();
        for n in 1..=segments.len() {
            let frames = CumulativeRenderer::new(false).render(&segments[..n]);
            let last = frames.last().unwrap();
            assert_eq!(last.accumulated_jp, segments[n - 1].cumulative_jp);
            assert_eq!(last.accumulated_kr, segments[n - 1].cumulative_kr);
            assert_eq!(last.accumulated_translation, segments[n - 1].cumulative_translation);
        }
    }

    #[test]
    fn test_new_parts_reconstruct_accumulated_text() {
        let segments = dinner();
        for separator in [false, true] {
            let frames = CumulativeRenderer::new(separator).render(&segments);
            for k in 0..frames.len() {
                let jp: String = frames[..=k].iter().map(|f| f.jp.contribution()).collect();
                let kr: String = frames[..=k].iter().map(|f| f.kr.contribution()).collect();
                let tr: String = frames[..=k]
                    .iter()
                    .map(|f| f.translation.contribution())
                    .collect();
                assert_eq!(jp, frames[k].accumulated_jp);
                assert_eq!(kr, frames[k].accumulated_kr);
                assert_eq!(tr, frames[k].accumulated_translation);
            }
        }
    }

    #[test]
    fn test_separator_mode_rebuilds_prefix_from_raw_words() {
        let segments = dinner();
        let frames = CumulativeRenderer::new(true).render(&segments);

        assert_eq!(frames[3].accumulated_jp, "今日の/晩ご飯は/何を/食べようか");
        assert_eq!(frames[3].jp.to_markup(), "今日の/晩ご飯は/何を/<new>食べようか</new>");
        assert_eq!(frames[3].meanings, "오늘의/저녁밥은/무엇을/먹을까");
        // the Korean stream never gets separators
        assert_eq!(frames[3].accumulated_kr, "쿄-노 방고항와 나니오 타베요-카");
    }

    #[test]
    fn test_plain_mode_highlight() {
        let frames = CumulativeRenderer::new(false).render(&dinner());
        assert_eq!(frames[0].jp.to_markup(), "<new>今日の</new>");
        assert_eq!(frames[1].jp.to_markup(), "今日の<new>晩ご飯は</new>");
        assert_eq!(frames[3].meanings, "오늘의 저녁밥은 무엇을 먹을까");
    }

    #[test]
    fn test_non_prefix_fields_do_not_panic() {
        let segments = vec![
            seg("長い", "", "", "とても長い文章", "", ""),
            seg("短", "", "", "短", "", ""),
        ];
        let frames = CumulativeRenderer::new(false).render(&segments);
        assert_eq!(frames[1].jp.new, "");
        assert_eq!(frames[1].accumulated_jp, "とても長い文章");
    }

    #[test]
    fn test_summary() {
        let renderer = CumulativeRenderer::default();
        let summary = renderer.summary(&dinner()).unwrap();

        assert_eq!(summary.jp, "今日の晩ご飯は何を食べようか");
        assert_eq!(summary.reading, "きょうの/ばんごはんは/なにを/たべようか");
        assert_eq!(summary.translation, "오늘의 저녁밥은 무엇을 먹을까");
        assert!(renderer.summary(&[]).is_none());
    }
}
