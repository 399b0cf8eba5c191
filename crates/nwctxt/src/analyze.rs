//! Structural analysis: bar counts, pickup detection, lead-in measures,
//! and lyric-to-measure alignment.
//!
//! The staves are found by the naming convention of the source files: the
//! `Bass` staff carries the song structure (bars, tempo, markers) and the
//! `Zang` staff carries the melody with lyrics.

use crate::feedback::{Analyzed, FeedbackCollector};
use crate::model::{
    is_bar, quoted_field, Document, Staff, PREFIX_LYRIC, PREFIX_NOTE, PREFIX_REST, PREFIX_TEXT,
    START_MARKER,
};
use crate::timing::{self, TimeSig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structure staff: bars, tempo, the `liedstart` marker.
pub const STAFF_BASS: &str = "Bass";
/// Vocal staff: melody notes plus the `|Lyric1|` line.
pub const STAFF_ZANG: &str = "Zang";

/// Count bar elements on a staff.
///
/// Caveat: a staff that opens with un-barred notes has an implicit first
/// measure that no bar element closes off, so it is not counted here.
/// Callers compensate with the pickup check: no pickup means the count is
/// one short.
pub fn count_bars(staff: &Staff) -> usize {
    staff.lines.iter().filter(|line| is_bar(line)).count()
}

/// True when a rest element appears before the first bar element — the
/// signature of a pickup measure ("begintel").
pub fn has_pickup(staff: &Staff) -> bool {
    for line in &staff.lines {
        if is_bar(line) {
            return false;
        }
        if line.starts_with(PREFIX_REST) {
            return true;
        }
    }
    false
}

/// Count whole measures before the song's start marker ("maten vooraf").
///
/// Bars strictly before the first `|Text|Text:"liedstart"` line; when a
/// pickup exists its bar must not double as lead-in, so one is subtracted.
pub fn count_lead_in(staff: &Staff) -> usize {
    let marker = format!("{PREFIX_TEXT}Text:\"{START_MARKER}\"");
    let marker_index = staff
        .lines
        .iter()
        .position(|line| line.trim_start().starts_with(&marker));
    let Some(marker_index) = marker_index else {
        return 0;
    };

    let bars_before = staff.lines[..marker_index]
        .iter()
        .filter(|line| is_bar(line.trim_start()))
        .count();

    if bars_before > 0 && has_pickup(staff) {
        bars_before - 1
    } else {
        bars_before
    }
}

/// Split the quoted payload of a `|Lyric1|Text:"..."` line into syllables.
///
/// `\'` unescapes to an apostrophe, `\n` to a space; spaces and hyphens
/// separate syllables; underscores stay inside a syllable (they tie
/// syllables across notes).
pub fn split_syllables(lyric_line: &str) -> Vec<String> {
    let Some(payload) = quoted_field(lyric_line, "Text") else {
        return Vec::new();
    };
    let text = payload.replace("\\'", "'").replace("\\n", " ");

    text.split([' ', '-'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Syllables from the first lyric line on a staff, empty when there is none.
pub fn lyric_syllables(staff: &Staff) -> Vec<String> {
    staff
        .lines
        .iter()
        .find(|line| line.starts_with(PREFIX_LYRIC))
        .map(|line| split_syllables(line))
        .unwrap_or_default()
}

/// Map from measure number to the syllables sung in it.
///
/// Keys are signed: measure 0 is content before the first bar, and after
/// lead-in renumbering keys can drop below 1.
pub type MeasureLyrics = BTreeMap<i32, Vec<String>>;

/// Assign syllables to measures in a single forward scan.
///
/// Bar elements advance the measure counter. A note element consumes the
/// next syllable unless a previous tied or slurred note set the skip flag;
/// a skipped note keeps the flag alive only while it continues the tie.
/// Tie detection is a best-effort pattern match: a `Slur` field or a
/// trailing `^` glyph. Rests never consume a syllable.
pub fn map_lyrics_to_measures(staff: &Staff, syllables: &[String]) -> MeasureLyrics {
    let mut map = MeasureLyrics::new();
    let mut current_measure: i32 = 0;
    let mut syllable_index = 0;
    let mut skip_next_note = false;

    for raw in &staff.lines {
        let line = raw.trim();
        if is_bar(line) {
            current_measure += 1;
            map.entry(current_measure).or_default();
        } else if line.starts_with(PREFIX_NOTE) && syllable_index < syllables.len() {
            let continues_tie = line.contains("Slur") || line.ends_with('^');
            if skip_next_note {
                skip_next_note = continues_tie;
            } else {
                map.entry(current_measure)
                    .or_default()
                    .push(syllables[syllable_index].clone());
                syllable_index += 1;
                skip_next_note = continues_tie;
            }
        } else if line.starts_with(PREFIX_REST) {
            // Rests never carry lyrics.
        }
    }

    map
}

/// Complete analysis of one (usually merged) document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongAnalysis {
    pub title: String,
    pub tempo: Option<u32>,
    pub timesig: Option<TimeSig>,
    /// Raw bar-element count on the structure staff.
    pub raw_bars: usize,
    pub has_pickup: bool,
    /// Whole count-in measures before the start marker.
    pub lead_in: usize,
    /// Corrected total: pickup adjustment applied first, lead-in
    /// subtracted second.
    pub total_measures: usize,
    /// Duration of the corrected total, unknown when tempo or time
    /// signature is missing.
    pub duration_seconds: Option<f64>,
    /// Lyrics per measure, renumbered so the measure holding the start
    /// marker is measure 1.
    pub measure_lyrics: MeasureLyrics,
}

/// Analyze a document end to end.
///
/// `tempo` and `timesig` override what the structure staff declares; pass
/// `None` to extract them from the file. A missing required staff degrades
/// to `None` with feedback, never a failure.
pub fn analyze(
    document: &Document,
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
) -> Analyzed<Option<SongAnalysis>> {
    let mut collector = FeedbackCollector::new();

    let Some(bass) = document.staff_by_name(STAFF_BASS) else {
        collector.error(format!("no '{STAFF_BASS}' staff found"));
        return Analyzed::new(None, collector.into_feedback());
    };
    let Some(zang) = document.staff_by_name(STAFF_ZANG) else {
        collector.error(format!("no '{STAFF_ZANG}' staff found"));
        return Analyzed::new(None, collector.into_feedback());
    };

    let raw_bars = count_bars(bass);
    let pickup = has_pickup(bass);
    let lead_in = count_lead_in(bass);

    // A staff without a pickup has one more measure than it has bar
    // elements (the un-barred first measure).
    let adjusted = if pickup { raw_bars } else { raw_bars + 1 };
    let total_measures = adjusted.saturating_sub(lead_in);
    if lead_in > adjusted {
        collector.warning(format!(
            "lead-in of {lead_in} measures exceeds the measure total {adjusted}"
        ));
    }

    let (found_tempo, found_timesig) = timing::tempo_and_timesig(bass);
    let tempo = tempo.or(found_tempo);
    let timesig = timesig.or(found_timesig);
    if tempo.is_none() {
        collector.warning("no usable tempo found, duration unknown");
    }
    if timesig.is_none() {
        collector.warning("no usable time signature found, duration unknown");
    }

    let duration_seconds = timing::total_duration(&[total_measures as u32], tempo, timesig, 0.0);

    let syllables = lyric_syllables(zang);
    if syllables.is_empty() {
        collector.info(format!("no lyrics found on the '{STAFF_ZANG}' staff"));
    }
    let raw_map = map_lyrics_to_measures(zang, &syllables);
    let measure_lyrics: MeasureLyrics = raw_map
        .into_iter()
        .map(|(measure, syllables)| (measure - lead_in as i32, syllables))
        .collect();

    let analysis = SongAnalysis {
        title: document.title().unwrap_or_else(|| "Unknown".to_string()),
        tempo,
        timesig,
        raw_bars,
        has_pickup: pickup,
        lead_in,
        total_measures,
        duration_seconds,
        measure_lyrics,
    };

    Analyzed::new(Some(analysis), collector.into_feedback())
}
