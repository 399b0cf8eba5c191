//! Concatenation of per-section documents into one song.
//!
//! Setup metadata (add-staff, staff properties, instrument, clef, time
//! signature, and normally tempo) is declared once per song, so it is
//! stripped from every section after the first. A double-bar separator at
//! each join keeps section boundaries measure-aligned.

use crate::chords::section_measure_count;
use crate::feedback::{Analyzed, FeedbackCollector};
use crate::model::{
    is_bar, Document, PREFIX_ADD_STAFF, PREFIX_CLEF, PREFIX_STAFF_INSTRUMENT,
    PREFIX_STAFF_PROPERTIES, PREFIX_TEMPO, PREFIX_TIMESIG,
};
use crate::timing::{total_duration, TimeSig};
use serde::{Deserialize, Serialize};

/// Separator inserted at a section join that does not start on a bar.
pub const SECTION_SEPARATOR: &str = "|Bar|Style:Double";

/// One section in the song's playing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub name: String,
    /// Measure count of the section file, unknown when it cannot be
    /// derived.
    pub measures: Option<u32>,
    /// Offset of the section start in seconds: the summed duration of all
    /// prior sections plus the pickup-beat offset. Unknown without tempo
    /// and time signature.
    pub start_seconds: Option<f64>,
}

/// Merge section documents staff-by-staff into one document.
///
/// The first document seeds the result verbatim. Later documents lose
/// their setup lines (and tempo lines, unless `keep_tempi`) and are
/// appended to the staff at the same index. A staff-count mismatch is a
/// warning; the common prefix is still merged.
pub fn concatenate(documents: &[Document], keep_tempi: bool) -> Analyzed<Document> {
    let mut collector = FeedbackCollector::new();

    let Some((first, rest)) = documents.split_first() else {
        collector.error("nothing to concatenate: no documents given");
        return Analyzed::new(Document::default(), collector.into_feedback());
    };
    let mut merged = first.clone();

    let mut skip_prefixes = vec![
        PREFIX_ADD_STAFF,
        PREFIX_STAFF_PROPERTIES,
        PREFIX_STAFF_INSTRUMENT,
        PREFIX_CLEF,
        PREFIX_TIMESIG,
    ];
    if !keep_tempi {
        skip_prefixes.push(PREFIX_TEMPO);
    }

    for (index, document) in rest.iter().enumerate() {
        if document.staves.len() != merged.staves.len() {
            collector.warning(format!(
                "section {} has {} staves, expected {}; merging the common prefix",
                index + 2,
                document.staves.len(),
                merged.staves.len()
            ));
        }
        let common = document.staves.len().min(merged.staves.len());

        for staff_index in 0..common {
            let body: Vec<String> = document.staves[staff_index]
                .lines
                .iter()
                .filter(|line| !skip_prefixes.iter().any(|prefix| line.starts_with(prefix)))
                .cloned()
                .collect();

            let target = &mut merged.staves[staff_index].lines;
            if body.first().map(|line| !is_bar(line)).unwrap_or(false) {
                target.push(SECTION_SEPARATOR.to_string());
            }
            target.extend(body);
        }
    }

    Analyzed::new(merged, collector.into_feedback())
}

/// Build one [`SectionEntry`] per sequence position.
///
/// Start offsets are prefix sums: entry `i` starts where sections `0..i`
/// end, shifted by the pickup offset. Sections whose measure count is
/// unknown contribute zero to the sums.
pub fn build_sections(
    names: &[String],
    documents: &[Document],
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
    pickup_beats: f64,
) -> Vec<SectionEntry> {
    let mut entries: Vec<SectionEntry> = Vec::with_capacity(names.len());

    for (name, document) in names.iter().zip(documents) {
        let prior: Vec<u32> = entries.iter().map(|e| e.measures.unwrap_or(0)).collect();
        let start_seconds = total_duration(&prior, tempo, timesig, pickup_beats);
        entries.push(SectionEntry {
            name: name.clone(),
            measures: section_measure_count(document),
            start_seconds,
        });
    }

    entries
}
