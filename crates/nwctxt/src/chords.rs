//! Chord timeline extraction and repeat-aware measure counting.
//!
//! Chords are run-length encoded as `|Text|` annotations (`akk:C`) on the
//! first staff: each marker starts a span that runs until the next marker
//! or the end of the staff. Only sounding measures (those containing a
//! `Dur:` element) extend a span.

use crate::model::{field_value, is_bar, quoted_field, Document, Staff, PREFIX_TEXT};
use serde::{Deserialize, Serialize};

/// Tag that marks a chord annotation inside a text element.
pub const CHORD_TAG: &str = "akk:";

/// One chord and the number of sounding measures it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSpan {
    pub symbol: String,
    pub measures: u32,
}

/// Scan a staff for chord markers and build the chord timeline.
///
/// Measures before the first marker are not represented. A trailing marker
/// that never sees a sounding measure is dropped.
pub fn chord_timeline(staff: &Staff) -> Vec<ChordSpan> {
    let mut spans = Vec::new();
    let mut current: Option<String> = None;
    let mut measures = 0u32;
    let mut measure_has_sound = false;

    for line in &staff.lines {
        if line.starts_with(PREFIX_TEXT) {
            let symbol = quoted_field(line, "Text")
                .map(str::trim)
                .and_then(|text| text.strip_prefix(CHORD_TAG));
            if let Some(symbol) = symbol {
                if let Some(previous) = current.take() {
                    spans.push(ChordSpan {
                        symbol: previous,
                        measures,
                    });
                }
                current = Some(symbol.trim().to_string());
                measures = 0;
                measure_has_sound = false;
            }
        }

        if is_bar(line) {
            if current.is_some() && measure_has_sound {
                measures += 1;
            }
            measure_has_sound = false;
        }

        if line.contains("|Dur:") {
            measure_has_sound = true;
        }
    }

    if let Some(last) = current {
        if measure_has_sound {
            measures += 1;
        }
        if measures >= 1 {
            spans.push(ChordSpan {
                symbol: last,
                measures,
            });
        }
    }

    spans
}

/// Format a timeline as `"B, F#, E(2), B(5)"`: spans of one measure are
/// unannotated. An empty timeline renders as `-`.
pub fn format_timeline(spans: &[ChordSpan]) -> String {
    if spans.is_empty() {
        return "-".to_string();
    }
    spans
        .iter()
        .map(|span| {
            if span.measures > 1 {
                format!("{}({})", span.symbol, span.measures)
            } else {
                span.symbol.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Total measures the timeline claims, for cross-checking against the
/// section's actual measure count. Unannotated spans count as one.
pub fn timeline_measures(spans: &[ChordSpan]) -> u32 {
    spans.iter().map(|span| span.measures.max(1)).sum()
}

/// Measure count of a section file, read from its second staff.
///
/// A `Style:LocalRepeatClose|Repeat:N` bar supplies the count directly
/// (the written-out measures repeat N times); sounding measures after the
/// close are added on top. Without a repeat marker, every sounding measure
/// is counted. `None` when the document has fewer than two staves or
/// nothing to count.
pub fn section_measure_count(document: &Document) -> Option<u32> {
    let staff = document.staff_by_index(1)?;

    let mut repeat_count: Option<u32> = None;
    let mut after_repeat = 0u32;
    let mut total = 0u32;
    let mut past_repeat = false;
    let mut measure_has_sound = false;

    for line in &staff.lines {
        let repeat = if line.contains("Style:LocalRepeatClose") {
            field_value(line, "Repeat:").and_then(|v| v.parse::<u32>().ok())
        } else {
            None
        };

        if let Some(repeat) = repeat {
            repeat_count = Some(repeat);
            past_repeat = true;
            measure_has_sound = false;
        } else if is_bar(line) {
            if measure_has_sound {
                if past_repeat {
                    after_repeat += 1;
                } else {
                    total += 1;
                }
            }
            measure_has_sound = false;
        } else if line.contains("|Dur:") {
            measure_has_sound = true;
        }
    }
    if measure_has_sound {
        if past_repeat {
            after_repeat += 1;
        } else {
            total += 1;
        }
    }

    let count = match repeat_count {
        Some(repeat) => repeat + after_repeat,
        None => total,
    };
    (count > 0).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn staff(lines: &[&str]) -> Staff {
        Staff::new(lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_chord_timeline_spans() {
        let s = staff(&[
            "|Text|Text:\"akk:C\"|Font:User1",
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            "|Text|Text:\"akk:G\"|Font:User1",
            "|Note|Dur:Whole|Pos:1",
        ]);
        assert_eq!(
            chord_timeline(&s),
            vec![
                ChordSpan {
                    symbol: "C".to_string(),
                    measures: 2
                },
                ChordSpan {
                    symbol: "G".to_string(),
                    measures: 1
                },
            ]
        );
    }

    #[test]
    fn test_chord_timeline_skips_silent_measures() {
        let s = staff(&[
            "|Text|Text:\"akk:Am\"",
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            // No Dur element in this measure, so it does not count.
            "|Text|Text:\"tussenspel\"",
            "|Bar",
            "|Note|Dur:4th|Pos:0",
        ]);
        assert_eq!(
            chord_timeline(&s),
            vec![ChordSpan {
                symbol: "Am".to_string(),
                measures: 2
            }]
        );
    }

    #[test]
    fn test_chord_timeline_ignores_plain_text() {
        let s = staff(&["|Text|Text:\"liedstart\"", "|Note|Dur:4th|Pos:0"]);
        assert_eq!(chord_timeline(&s), vec![]);
    }

    #[test]
    fn test_chord_timeline_trailing_marker_dropped() {
        let s = staff(&[
            "|Text|Text:\"akk:D\"",
            "|Note|Dur:Whole|Pos:0",
            "|Bar",
            "|Text|Text:\"akk:A\"",
        ]);
        assert_eq!(
            chord_timeline(&s),
            vec![ChordSpan {
                symbol: "D".to_string(),
                measures: 1
            }]
        );
    }

    #[test]
    fn test_format_timeline() {
        let spans = vec![
            ChordSpan {
                symbol: "B".to_string(),
                measures: 1,
            },
            ChordSpan {
                symbol: "F#".to_string(),
                measures: 1,
            },
            ChordSpan {
                symbol: "E".to_string(),
                measures: 2,
            },
            ChordSpan {
                symbol: "B".to_string(),
                measures: 5,
            },
        ];
        assert_eq!(format_timeline(&spans), "B, F#, E(2), B(5)");
        assert_eq!(timeline_measures(&spans), 9);
        assert_eq!(format_timeline(&[]), "-");
    }

    fn two_staff_doc(second_staff_body: &[&str]) -> Document {
        let mut input = String::from("|AddStaff|Name:\"Zang\"\n|Note|Dur:4th|Pos:0\n");
        input.push_str("|AddStaff|Name:\"Bass\"\n");
        for line in second_staff_body {
            input.push_str(line);
            input.push('\n');
        }
        input.push_str("!NoteWorthyComposer-End\n");
        Document::parse(&input)
    }

    #[test]
    fn test_section_measure_count_plain() {
        let doc = two_staff_doc(&[
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            "|Note|Dur:4th|Pos:0",
        ]);
        assert_eq!(section_measure_count(&doc), Some(3));
    }

    #[test]
    fn test_section_measure_count_repeat() {
        let doc = two_staff_doc(&[
            "|Note|Dur:4th|Pos:0",
            "|Bar|Style:LocalRepeatClose|Repeat:4",
            "|Note|Dur:4th|Pos:0",
            "|Bar",
            "|Note|Dur:4th|Pos:0",
        ]);
        // Four repeats plus two sounding measures after the close.
        assert_eq!(section_measure_count(&doc), Some(6));
    }

    #[test]
    fn test_section_measure_count_single_staff() {
        let doc = Document::parse(
            "|AddStaff|Name:\"Zang\"\n|Note|Dur:4th|Pos:0\n!NoteWorthyComposer-End\n",
        );
        assert_eq!(section_measure_count(&doc), None);
    }

    #[test]
    fn test_section_measure_count_malformed_repeat() {
        let doc = two_staff_doc(&[
            "|Note|Dur:4th|Pos:0",
            "|Bar|Style:LocalRepeatClose|Repeat:veel",
            "|Note|Dur:4th|Pos:0",
        ]);
        // Unparsable repeat degrades to plain counting.
        assert_eq!(section_measure_count(&doc), Some(2));
    }
}
