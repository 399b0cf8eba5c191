//! The `concat` subcommand: merge a song's section files in sequence order
//! and derive the structure artifacts (merged file, analysis, LaTeX
//! summary, label track).

use crate::commands::analyze;
use crate::sequence;
use anyhow::{bail, Context, Result};
use liedconf::LiedConfig;
use nwctxt::chords::{chord_timeline, ChordSpan};
use nwctxt::concat::{build_sections, concatenate};
use nwctxt::report::{labeltrack, structure_tex};
use nwctxt::timing::{pickup_beats, tempo_and_timesig, TimeSig};
use nwctxt::Document;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Subfolder of a song's folder that holds its section files.
const FOLDER_NWC: &str = "nwc";

pub fn run(config: &LiedConfig, songtitle: &str, keep_tempi: bool) -> Result<()> {
    let song_folder = config.paths.songs_dir.join(songtitle);
    let nwc_folder = song_folder.join(FOLDER_NWC);
    if !nwc_folder.is_dir() {
        bail!("no section folder for '{songtitle}': {}", nwc_folder.display());
    }

    let sequence_path = nwc_folder.join(format!("{songtitle} {}", config.defaults.sequence_file));
    let sequence = sequence::load(&sequence_path)?;
    info!(
        song = songtitle,
        sequence = %sequence.songstructure.join(" - "),
        keep_tempi,
        "processing song"
    );

    let mut documents = Vec::with_capacity(sequence.songstructure.len());
    for name in &sequence.songstructure {
        let path = nwc_folder.join(format!("{songtitle} {name}.nwctxt"));
        documents.push(Document::from_path(&path)?);
    }

    // Tempo, time signature and pickup all come from the first section.
    let first = &documents[0];
    let mut tempo = None;
    let mut timesig = None;
    for staff in &first.staves {
        let (t, ts) = tempo_and_timesig(staff);
        tempo = tempo.or(t);
        timesig = timesig.or(ts);
        if tempo.is_some() && timesig.is_some() {
            break;
        }
    }
    let pickup = pickup_beats(first);
    if pickup > 0.0 {
        info!(beats = pickup, "detected pickup beats up front");
    }

    let entries = build_sections(&sequence.songstructure, &documents, tempo, timesig, pickup);
    for entry in &entries {
        if entry.measures.is_none() {
            warn!(section = %entry.name, "could not determine measure count");
        }
    }

    // Chord timeline once per unique section, from its first staff.
    let mut chords: HashMap<String, Vec<ChordSpan>> = HashMap::new();
    for (name, document) in sequence.songstructure.iter().zip(&documents) {
        if !chords.contains_key(name) {
            if let Some(staff) = document.staff_by_index(0) {
                chords.insert(name.clone(), chord_timeline(staff));
            }
        }
    }

    let result = concatenate(&documents, keep_tempi);
    for feedback in &result.feedback {
        warn!("{feedback}");
    }
    if result.has_errors() {
        bail!("concatenation failed for '{songtitle}'");
    }
    let merged = result.value;

    fs::create_dir_all(&config.paths.build_dir).with_context(|| {
        format!("creating build dir {}", config.paths.build_dir.display())
    })?;
    fs::create_dir_all(&config.paths.audio_dir).with_context(|| {
        format!("creating audio dir {}", config.paths.audio_dir.display())
    })?;

    let merged_path = config.paths.build_dir.join(format!("{songtitle}.nwctxt"));
    merged.write_to_path(&merged_path)?;
    info!(path = %merged_path.display(), sections = documents.len(), "wrote merged song");

    analyze::write_report(config, &merged_path, &merged, None, None)?;

    let tex_path = config
        .paths
        .build_dir
        .join(format!("{songtitle} structuur.tex"));
    let pdf_name = format!("{songtitle} structuur.pdf");
    let tex = structure_tex(&pdf_name, songtitle, tempo, timesig, &entries, &chords, pickup);
    fs::write(&tex_path, tex)
        .with_context(|| format!("writing structure file {}", tex_path.display()))?;
    info!(path = %tex_path.display(), "wrote structure file");

    match (labeltrack(&entries), tempo) {
        (Some(content), Some(tempo)) => {
            let label_path = config
                .paths
                .audio_dir
                .join(format!("{songtitle} labeltrack t_{tempo}.txt"));
            fs::write(&label_path, content)
                .with_context(|| format!("writing label track {}", label_path.display()))?;
            info!(path = %label_path.display(), "wrote label track");
        }
        _ => warn!("no label track written: tempo or section start times unknown"),
    }

    update_song_tex(&song_folder, songtitle, tempo, timesig);

    Ok(())
}

/// Refresh the `\maatsoort` and `\tempo` macros in the song's own lyrics
/// `.tex` file, when it exists. Failures here only warn; the merged song
/// and its artifacts are already on disk.
fn update_song_tex(
    song_folder: &Path,
    songtitle: &str,
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
) {
    let (Some(tempo), Some(timesig)) = (tempo, timesig) else {
        warn!("lyrics .tex not updated: tempo or time signature unknown");
        return;
    };
    if tempo < 10 {
        warn!(tempo, "lyrics .tex not updated: tempo implausibly low");
        return;
    }

    let tex_path = song_folder.join(format!("{songtitle}.tex"));
    let content = match fs::read_to_string(&tex_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %tex_path.display(), error = %e, "lyrics .tex not updated");
            return;
        }
    };

    let updated = replace_macro(&content, "maatsoort", &timesig.to_string());
    let updated = replace_macro(&updated, "tempo", &tempo.to_string());

    match fs::write(&tex_path, updated) {
        Ok(()) => info!(path = %tex_path.display(), tempo, maatsoort = %timesig, "updated lyrics .tex"),
        Err(e) => warn!(path = %tex_path.display(), error = %e, "lyrics .tex not updated"),
    }
}

/// Replace the body of `\newcommand{\name}{...}`; no-op when the macro is
/// absent or malformed.
fn replace_macro(content: &str, name: &str, value: &str) -> String {
    let needle = format!("\\newcommand{{\\{name}}}{{");
    let Some(pos) = content.find(&needle) else {
        return content.to_string();
    };
    let body_at = pos + needle.len();
    match content[body_at..].find('}') {
        Some(len) => format!(
            "{}{}{}",
            &content[..body_at],
            value,
            &content[body_at + len..]
        ),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_macro() {
        let tex = "\\newcommand{\\tempo}{100}\n\\newcommand{\\maatsoort}{3/4}\n";
        let updated = replace_macro(tex, "tempo", "96");
        let updated = replace_macro(&updated, "maatsoort", "4/4");
        assert_eq!(
            updated,
            "\\newcommand{\\tempo}{96}\n\\newcommand{\\maatsoort}{4/4}\n"
        );
    }

    #[test]
    fn test_replace_macro_missing() {
        let tex = "\\newcommand{\\titel}{X}\n";
        assert_eq!(replace_macro(tex, "tempo", "96"), tex);
    }
}
