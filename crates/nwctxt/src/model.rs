//! Document model for NoteWorthy Composer text files.
//!
//! A `.nwctxt` file is a sequence of lines: a header region, then one block
//! per staff introduced by an `|AddStaff|` line, closed by a single end
//! marker. The parser is a structural splitter, not a validator: every line
//! is preserved verbatim and unrecognized lines pass through untouched.

use crate::error::NwctxtError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Element prefixes recognized by the scanner. Everything else is opaque.
pub const PREFIX_ADD_STAFF: &str = "|AddStaff|";
pub const PREFIX_STAFF_PROPERTIES: &str = "|StaffProperties|";
pub const PREFIX_STAFF_INSTRUMENT: &str = "|StaffInstrument|";
pub const PREFIX_CLEF: &str = "|Clef|";
pub const PREFIX_TIMESIG: &str = "|TimeSig|";
pub const PREFIX_TEMPO: &str = "|Tempo|";
pub const PREFIX_NOTE: &str = "|Note|";
pub const PREFIX_REST: &str = "|Rest|";
pub const PREFIX_TEXT: &str = "|Text|";
pub const PREFIX_LYRIC: &str = "|Lyric1|";
pub const PREFIX_PAGE_SETUP: &str = "|PgSetup|";
pub const PREFIX_SONG_INFO: &str = "|SongInfo|";

/// Terminal line of every file. Consumed on parse, emitted on serialize.
pub const END_MARKER: &str = "!NoteWorthyComposer-End";

/// Text marker placed where the song proper begins, after any count-in.
pub const START_MARKER: &str = "liedstart";

/// A bar element is either a bare `|Bar` or `|Bar|Style:...`.
pub fn is_bar(line: &str) -> bool {
    line == "|Bar" || line.starts_with("|Bar|")
}

/// Extract a double-quoted field value, e.g. `quoted_field(line, "Name")`
/// on `|AddStaff|Name:"Zang"|Label:"Zang"` yields `Some("Zang")`.
pub fn quoted_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let tag = format!("{key}:\"");
    let start = line.find(&tag)? + tag.len();
    let end = line[start..].find('"')? + start;
    Some(&line[start..end])
}

/// Extract an unquoted field value: everything after `key` up to the next
/// `|` or end of line, e.g. `field_value(line, "Tempo:")`.
pub fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = &line[start..];
    Some(match rest.find('|') {
        Some(end) => &rest[..end],
        None => rest,
    })
}

/// One staff: its `|AddStaff|` line plus every element line up to the next
/// staff or the end marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub lines: Vec<String>,
}

impl Staff {
    pub fn new(lines: Vec<String>) -> Self {
        Staff { lines }
    }

    /// Staff name from the first `Name:"..."` field, usually on the
    /// `|AddStaff|` line. Re-derived from `lines` on every call.
    pub fn name(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| quoted_field(line, "Name"))
    }

    /// Whether this staff carries a second `|StaffProperties|` line.
    ///
    /// The observed files put structural setup on the first such line and
    /// playback state (Muted, Volume) on the second. That is a positional
    /// convention of the format, not a schema, so callers can check before
    /// relying on [`Staff::set_muted`] having any effect.
    pub fn has_playback_properties(&self) -> bool {
        self.playback_properties_index().is_some()
    }

    fn playback_properties_index(&self) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with(PREFIX_STAFF_PROPERTIES))
            .map(|(i, _)| i)
            .nth(1)
    }

    /// Rewrite the `Muted:` flag and `Volume:` value on the second
    /// `|StaffProperties|` line, leaving every other character untouched.
    /// No-op when no such line exists.
    pub fn set_muted(&mut self, muted: bool, volume: u8) {
        let Some(index) = self.playback_properties_index() else {
            return;
        };
        let mut line = self.lines[index].clone();
        line = replace_flag(&line, "Muted:", if muted { 'Y' } else { 'N' });
        line = replace_number(&line, "Volume:", volume as u32);
        self.lines[index] = line;
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Staff(name={:?}, lines={})", self.name(), self.lines.len())
    }
}

/// Replace the single `Y`/`N` character following `key`, if present.
fn replace_flag(line: &str, key: &str, value: char) -> String {
    match line.find(key) {
        Some(pos) => {
            let flag_at = pos + key.len();
            match line[flag_at..].chars().next() {
                Some('Y') | Some('N') => {
                    let mut out = String::with_capacity(line.len());
                    out.push_str(&line[..flag_at]);
                    out.push(value);
                    out.push_str(&line[flag_at + 1..]);
                    out
                }
                _ => line.to_string(),
            }
        }
        None => line.to_string(),
    }
}

/// Replace the digit run following `key`, if present.
fn replace_number(line: &str, key: &str, value: u32) -> String {
    match line.find(key) {
        Some(pos) => {
            let digits_at = pos + key.len();
            let digits_len = line[digits_at..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(line.len() - digits_at);
            if digits_len == 0 {
                return line.to_string();
            }
            format!(
                "{}{}{}",
                &line[..digits_at],
                value,
                &line[digits_at + digits_len..]
            )
        }
        None => line.to_string(),
    }
}

/// A parsed `.nwctxt` file: header lines plus an ordered list of staves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub header_lines: Vec<String>,
    pub staves: Vec<Staff>,
}

impl Document {
    /// Parse raw file content in a single forward scan.
    ///
    /// Lines before the first `|AddStaff|` form the header. Each
    /// `|AddStaff|` flushes the staff in progress; the end marker flushes
    /// the last one and is not stored. No line is ever rejected.
    pub fn parse(input: &str) -> Document {
        let mut header_lines = Vec::new();
        let mut staves = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut in_header = true;

        for raw in input.lines() {
            let line = raw.trim_end_matches('\r');
            if line.starts_with(PREFIX_ADD_STAFF) {
                in_header = false;
                if !current.is_empty() {
                    staves.push(Staff::new(std::mem::take(&mut current)));
                }
                current.push(line.to_string());
            } else if line == END_MARKER {
                if !current.is_empty() {
                    staves.push(Staff::new(std::mem::take(&mut current)));
                }
            } else if in_header {
                header_lines.push(line.to_string());
            } else {
                current.push(line.to_string());
            }
        }
        // A file without an end marker is malformed, but best-effort still
        // keeps the trailing staff.
        if !current.is_empty() {
            staves.push(Staff::new(current));
        }

        Document {
            header_lines,
            staves,
        }
    }

    /// Read and parse a file. Unlike malformed content, an unreadable file
    /// is an explicit error for the caller.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Document, NwctxtError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| NwctxtError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Document::parse(&content))
    }

    /// Serialize back to file content: header, staves, end marker.
    /// Round-trips byte-identically with [`Document::parse`] for
    /// well-formed input.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.header_lines {
            out.push_str(line);
            out.push('\n');
        }
        for staff in &self.staves {
            for line in &staff.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(END_MARKER);
        out.push('\n');
        out
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), NwctxtError> {
        let path = path.as_ref();
        std::fs::write(path, self.serialize()).map_err(|source| NwctxtError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn staff_by_name(&self, name: &str) -> Option<&Staff> {
        self.staves.iter().find(|s| s.name() == Some(name))
    }

    pub fn staff_by_index(&self, index: usize) -> Option<&Staff> {
        self.staves.get(index)
    }

    /// Song title from the header's `|SongInfo|Title:"..."` line, with the
    /// `\'` apostrophe escape resolved.
    pub fn title(&self) -> Option<String> {
        self.header_lines
            .iter()
            .filter(|line| line.starts_with(PREFIX_SONG_INFO))
            .find_map(|line| quoted_field(line, "Title"))
            .map(|title| title.replace("\\'", "'"))
    }

    /// Mute every staff at the given volume.
    pub fn mute_all(&mut self, volume: u8) {
        for staff in &mut self.staves {
            staff.set_muted(true, volume);
        }
    }

    /// Mute everything, then unmute the named staff. Returns false when no
    /// staff carries that name.
    pub fn solo(&mut self, name: &str, volume: u8) -> bool {
        self.mute_all(volume);
        let Some(staff) = self.staves.iter_mut().find(|s| s.name() == Some(name)) else {
            return false;
        };
        staff.set_muted(false, volume);
        true
    }

    /// One cloned document per named staff, each with only that staff
    /// unmuted. These drive per-staff audio rendering downstream.
    pub fn solo_documents(&self, volume: u8) -> Vec<(String, Document)> {
        let names: Vec<String> = self
            .staves
            .iter()
            .filter_map(|s| s.name().map(str::to_string))
            .collect();
        names
            .into_iter()
            .map(|name| {
                let mut doc = self.clone();
                doc.solo(&name, volume);
                (name, doc)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
!NoteWorthyComposer(2.751)
|SongInfo|Title:\"D\\'rom zingt het koor\"|Author:\"\"
|PgSetup|StaffSize:16|StartingBar:0
|AddStaff|Name:\"Zang\"|Label:\"Zang\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:N|Volume:127|StereoPan:64|Device:0|Channel:1
|Clef|Type:Treble
|TimeSig|Signature:4/4
|Tempo|Tempo:120|Pos:12
|Note|Dur:4th|Pos:0
|Bar
|Note|Dur:Half|Pos:1
|AddStaff|Name:\"Bass\"|Label:\"Bass\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:N|Volume:110|StereoPan:64|Device:0|Channel:2
|Clef|Type:Bass
|Rest|Dur:4th
|Bar
|Note|Dur:Whole|Pos:-3
!NoteWorthyComposer-End
";

    #[test]
    fn test_parse_splits_header_and_staves() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.header_lines.len(), 3);
        assert_eq!(doc.staves.len(), 2);
        assert_eq!(doc.staves[0].name(), Some("Zang"));
        assert_eq!(doc.staves[1].name(), Some("Bass"));
    }

    #[test]
    fn test_round_trip() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.serialize(), SAMPLE);
    }

    #[test]
    fn test_end_marker_not_stored() {
        let doc = Document::parse(SAMPLE);
        for staff in &doc.staves {
            assert!(!staff.lines.iter().any(|l| l == END_MARKER));
        }
    }

    #[test]
    fn test_title_unescapes_apostrophe() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.title(), Some("D'rom zingt het koor".to_string()));
    }

    #[test]
    fn test_set_muted_rewrites_second_properties_line() {
        let mut doc = Document::parse(SAMPLE);
        doc.staves[0].set_muted(true, 96);
        assert_eq!(
            doc.staves[0].lines[2],
            "|StaffProperties|Muted:Y|Volume:96|StereoPan:64|Device:0|Channel:1"
        );
        // The first properties line is untouched.
        assert_eq!(
            doc.staves[0].lines[1],
            "|StaffProperties|EndingBar:Section Close|Visible:Y"
        );
    }

    #[test]
    fn test_set_muted_noop_without_second_properties_line() {
        let mut staff = Staff::new(vec![
            "|AddStaff|Name:\"Solo\"".to_string(),
            "|StaffProperties|EndingBar:Section Close".to_string(),
        ]);
        let before = staff.lines.clone();
        staff.set_muted(true, 127);
        assert_eq!(staff.lines, before);
        assert!(!staff.has_playback_properties());
    }

    #[test]
    fn test_solo_unmutes_one_staff() {
        let mut doc = Document::parse(SAMPLE);
        assert!(doc.solo("Bass", 127));
        assert!(doc.staves[0].lines[2].contains("Muted:Y"));
        assert!(doc.staves[1].lines[2].contains("Muted:N"));
        assert!(doc.staves[1].lines[2].contains("Volume:127"));
    }

    #[test]
    fn test_solo_unknown_name() {
        let mut doc = Document::parse(SAMPLE);
        assert!(!doc.solo("Drums", 127));
    }

    #[test]
    fn test_solo_documents_one_per_staff() {
        let doc = Document::parse(SAMPLE);
        let solos = doc.solo_documents(127);
        assert_eq!(solos.len(), 2);
        assert_eq!(solos[0].0, "Zang");
        assert!(solos[0].1.staves[0].lines[2].contains("Muted:N"));
        assert!(solos[0].1.staves[1].lines[2].contains("Muted:Y"));
    }

    #[test]
    fn test_is_bar() {
        assert!(is_bar("|Bar"));
        assert!(is_bar("|Bar|Style:Double"));
        assert!(!is_bar("|BarFoo"));
        assert!(!is_bar("|Note|Dur:4th"));
    }

    #[test]
    fn test_unrecognized_lines_preserved() {
        let input = "!Weird header\n|AddStaff|Name:\"A\"\n|Mystery|Field:1\n!NoteWorthyComposer-End\n";
        let doc = Document::parse(input);
        assert_eq!(doc.staves[0].lines[1], "|Mystery|Field:1");
        assert_eq!(doc.serialize(), input);
    }
}
