//! Musical-time extraction and arithmetic.
//!
//! Tempo and time signature come from first-occurrence scans over a staff.
//! Durations are computed from measure counts; a pickup (anacrusis) adds a
//! fractional-beat offset derived from the first rest's duration code.

use crate::model::{
    field_value, is_bar, Document, Staff, PREFIX_PAGE_SETUP, PREFIX_REST, PREFIX_TEMPO,
    PREFIX_TIMESIG,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `beats/unit` time signature, e.g. `4/4` or `6/8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSig {
    pub beats: u32,
    pub unit: u32,
}

impl FromStr for TimeSig {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (beats, unit) = s.split_once('/').ok_or(())?;
        let beats: u32 = beats.trim().parse().map_err(|_| ())?;
        let unit: u32 = unit.trim().parse().map_err(|_| ())?;
        if beats == 0 || unit == 0 {
            return Err(());
        }
        Ok(TimeSig { beats, unit })
    }
}

impl fmt::Display for TimeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

/// Note/rest duration codes as written in the format: a base name plus
/// comma-separated modifiers, e.g. `4th`, `Half,Dotted`, `8th,Triplet=First`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseDuration {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl BaseDuration {
    pub fn parse(s: &str) -> Option<BaseDuration> {
        match s {
            "Whole" => Some(BaseDuration::Whole),
            "Half" => Some(BaseDuration::Half),
            "4th" => Some(BaseDuration::Quarter),
            "8th" => Some(BaseDuration::Eighth),
            "16th" => Some(BaseDuration::Sixteenth),
            "32nd" => Some(BaseDuration::ThirtySecond),
            "64th" => Some(BaseDuration::SixtyFourth),
            _ => None,
        }
    }

    /// Fraction of a whole note.
    pub fn whole_fraction(&self) -> f64 {
        match self {
            BaseDuration::Whole => 1.0,
            BaseDuration::Half => 0.5,
            BaseDuration::Quarter => 0.25,
            BaseDuration::Eighth => 0.125,
            BaseDuration::Sixteenth => 0.0625,
            BaseDuration::ThirtySecond => 0.03125,
            BaseDuration::SixtyFourth => 0.015625,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationCode {
    pub base: BaseDuration,
    pub dotted: bool,
    pub double_dotted: bool,
    pub triplet: bool,
}

impl DurationCode {
    /// Parse a `Dur:` field value. Unknown bases yield `None`; unknown
    /// modifiers are ignored.
    pub fn parse(code: &str) -> Option<DurationCode> {
        let mut parts = code.split(',');
        let base = BaseDuration::parse(parts.next()?.trim())?;
        let mut parsed = DurationCode {
            base,
            dotted: false,
            double_dotted: false,
            triplet: false,
        };
        for modifier in parts {
            let modifier = modifier.trim();
            if modifier == "Dotted" || modifier == "Dot" {
                parsed.dotted = true;
            } else if modifier == "DblDotted" {
                parsed.double_dotted = true;
            } else if modifier.starts_with("Triplet") {
                parsed.triplet = true;
            }
        }
        Some(parsed)
    }

    /// Fraction of a whole note, modifiers applied.
    pub fn whole_fraction(&self) -> f64 {
        let mut value = self.base.whole_fraction();
        if self.double_dotted {
            value *= 1.75;
        } else if self.dotted {
            value *= 1.5;
        }
        if self.triplet {
            value *= 2.0 / 3.0;
        }
        value
    }

    /// Number of beats this duration spans, for the given beat unit
    /// (the time-signature denominator).
    pub fn beats(&self, unit: u32) -> f64 {
        self.whole_fraction() * unit as f64
    }
}

/// First-occurrence scan for tempo and time signature on a staff.
/// Stops once both are found; malformed numerics stay `None`.
pub fn tempo_and_timesig(staff: &Staff) -> (Option<u32>, Option<TimeSig>) {
    let mut tempo = None;
    let mut timesig = None;

    for line in &staff.lines {
        if tempo.is_none() && line.starts_with(PREFIX_TEMPO) {
            tempo = field_value(line, "Tempo:").and_then(|v| v.parse().ok());
        }
        if timesig.is_none() && line.starts_with(PREFIX_TIMESIG) {
            timesig = field_value(line, "Signature:").and_then(|v| v.parse().ok());
        }
        if tempo.is_some() && timesig.is_some() {
            break;
        }
    }

    (tempo, timesig)
}

/// Pickup beats ("begintel") at the start of a document.
///
/// A pickup exists when the first page-setup line declares `StartingBar:0`
/// and the first sounding element anywhere in the file is a rest before any
/// bar. The rest's duration code is converted to beats using the declared
/// time-signature denominator (default 4).
pub fn pickup_beats(document: &Document) -> f64 {
    let first_page_setup = document
        .header_lines
        .iter()
        .find(|line| line.starts_with(PREFIX_PAGE_SETUP));
    let starts_at_bar_zero = first_page_setup
        .map(|line| {
            line.split('|')
                .any(|field| field.trim() == "StartingBar:0")
        })
        .unwrap_or(false);
    if !starts_at_bar_zero {
        return 0.0;
    }

    let all_lines = document
        .header_lines
        .iter()
        .chain(document.staves.iter().flat_map(|s| s.lines.iter()));

    let mut unit = 4;
    let mut first_rest: Option<&str> = None;
    for line in all_lines.clone() {
        if line.starts_with(PREFIX_TIMESIG) {
            if let Some(sig) = field_value(line, "Signature:").and_then(|v| v.parse::<TimeSig>().ok())
            {
                unit = sig.unit;
                break;
            }
        }
    }
    for line in all_lines {
        if is_bar(line) {
            // A full measure comes first, so there is no pickup.
            return 0.0;
        }
        if line.starts_with(PREFIX_REST) {
            first_rest = field_value(line, "Dur:");
            break;
        }
    }

    match first_rest.and_then(DurationCode::parse) {
        Some(code) => code.beats(unit),
        None => 0.0,
    }
}

/// Total elapsed time in seconds for the given measure counts.
///
/// `None` when tempo or time signature is unknown or tempo is zero. Beats
/// per measure use the numerator only, matching the observed files; compound
/// meters like 6/8 are counted in eighths, which is a known limitation.
pub fn total_duration(
    measure_counts: &[u32],
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
    pickup_beats: f64,
) -> Option<f64> {
    let tempo = tempo.filter(|t| *t > 0)?;
    let timesig = timesig?;

    let beat_duration = 60.0 / tempo as f64;
    let measure_duration = timesig.beats as f64 * beat_duration;
    let measures: u64 = measure_counts.iter().map(|m| *m as u64).sum();

    Some(measures as f64 * measure_duration + pickup_beats * beat_duration)
}

/// Round to whole seconds and format as `m:ss`.
pub fn format_mmss(seconds: f64) -> String {
    let total = seconds.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}
