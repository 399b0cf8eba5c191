//! Text artifacts derived from an analysis: the plain-text analysis
//! report, the LaTeX song-structure summary, and the label track consumed
//! by external audio-editing tooling.
//!
//! Everything here is a pure string builder; writing files is the
//! caller's business.

use crate::analyze::SongAnalysis;
use crate::chords::{format_timeline, timeline_measures, ChordSpan};
use crate::concat::SectionEntry;
use crate::timing::{format_mmss, total_duration, TimeSig};
use std::collections::HashMap;

/// The song number is the last run of digits in a file stem, e.g.
/// `"She's so beautiful (22)"` → `"22"`.
pub fn song_number(stem: &str) -> Option<String> {
    let mut last: Option<String> = None;
    let mut current = String::new();
    for c in stem.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            last = Some(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        last = Some(current);
    }
    last
}

/// Plain-text analysis report with the measure/lyrics table.
///
/// Measures below 1 (content before the renumbered song start) are left
/// out of the table.
pub fn analysis_report(
    analysis: &SongAnalysis,
    file_name: &str,
    location: &str,
    song_number: Option<&str>,
) -> String {
    let mut lines = Vec::new();
    lines.push("*** NWC ANALYSE ***".to_string());
    lines.push(String::new());
    lines.push(format!("Analyse van: {file_name}"));
    lines.push(format!("Locatie: {location}"));
    lines.push(String::new());
    lines.push(format!("liedtitel: {}", analysis.title));
    if let Some(number) = song_number {
        lines.push(format!("liednummer: {number}"));
    }
    lines.push(format!("totaal aantal maten: {}", analysis.total_measures));
    lines.push(format!(
        "heeft begintel: {}",
        if analysis.has_pickup { "ja" } else { "nee" }
    ));
    lines.push(format!("aantal maten vooraf: {}", analysis.lead_in));
    lines.push(String::new());
    lines.push("maat\ttekst".to_string());

    for (measure, syllables) in &analysis.measure_lyrics {
        if *measure < 1 {
            continue;
        }
        lines.push(format!("{measure}\t{}", syllables.join(" ")));
    }

    lines.join("\n")
}

/// Escape LaTeX special characters in interpolated text.
pub fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Chord column for one section: the formatted timeline, flagged when its
/// measure sum disagrees with the section's measure count.
fn chord_column(spans: Option<&Vec<ChordSpan>>, measures: Option<u32>) -> String {
    let spans = spans.map(Vec::as_slice).unwrap_or(&[]);
    let mut column = format_timeline(spans);
    if column != "-" {
        if let Some(measures) = measures {
            if timeline_measures(spans) != measures {
                column.push_str(" [INVALID COUNT]");
            }
        }
    }
    column
}

/// Complete LaTeX song-structure summary.
///
/// Three tables: Basis (title, time signature, tempo, total measures,
/// duration), Lied delen (unique sections with measures and chords), and
/// the numbered Compositie sequence.
pub fn structure_tex(
    pdf_name: &str,
    title: &str,
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
    entries: &[SectionEntry],
    chords: &HashMap<String, Vec<ChordSpan>>,
    pickup_beats: f64,
) -> String {
    let mut out = String::new();

    out.push_str("\\documentclass[a4paper,11pt]{article}\n");
    out.push_str("\\usepackage[utf8]{inputenc}\n");
    out.push_str("\\usepackage[dutch]{babel}\n");
    out.push_str("\\usepackage{array}\n");
    out.push_str("\\usepackage[margin=2cm]{geometry}\n");
    out.push_str("\\pagestyle{empty}\n");
    out.push('\n');
    out.push_str("\\usepackage{fancyhdr}  % for footer, header\n");
    out.push_str("\\pagestyle{fancy}\n");
    out.push_str("\\fancyhf{} % clear all header and footer fields\n");
    out.push_str("\\renewcommand{\\headrulewidth}{0pt}  % clear hrule in header\n");
    out.push_str(
        "\\cfoot{\\fontsize{6pt}{7.2pt}\\selectfont autogenerated \\hspace{0.5cm} \\today }\n",
    );
    out.push_str(&format!(
        "\\chead{{\\fontsize{{8pt}}{{9.6pt}}\\selectfont {}}}\n",
        latex_escape(pdf_name)
    ));
    out.push('\n');
    out.push_str("\\begin{document}\n\n");
    out.push_str("\\section*{Lied structuur}\n\n");

    let total_measures: u32 = entries.iter().filter_map(|e| e.measures).sum();
    let counts: Vec<u32> = entries.iter().map(|e| e.measures.unwrap_or(0)).collect();
    let duration = match total_duration(&counts, tempo, timesig, pickup_beats) {
        Some(seconds) => format_mmss(seconds),
        None => "?".to_string(),
    };

    out.push_str("\\begin{tabular}{ll}\n");
    out.push_str("\\hline\n");
    out.push_str("\\textbf{Basis} & \\\\\n");
    out.push_str("\\hline\n");
    out.push_str(&format!("Titel & {} \\\\\n", latex_escape(title)));
    out.push_str(&format!(
        "Maatsoort & {} \\\\\n",
        timesig.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string())
    ));
    out.push_str(&format!(
        "Tempo & {} \\\\\n",
        tempo.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string())
    ));
    out.push_str(&format!("\\#Maten & {total_measures} \\\\\n"));
    out.push_str(&format!("Duur & {duration} \\\\\n"));
    out.push_str("\\hline\n");
    out.push_str("\\end{tabular}\n\n");
    out.push_str("\\vspace{0.5cm}\n\n");

    // Unique sections in order of first appearance.
    let mut unique: Vec<&SectionEntry> = Vec::new();
    for entry in entries {
        if !unique.iter().any(|e| e.name == entry.name) {
            unique.push(entry);
        }
    }

    out.push_str("\\subsection*{Lied delen}\n\n");
    out.push_str("\\begin{tabular}{l|c|p{8cm}}\n");
    out.push_str("\\hline\n");
    out.push_str("\\textbf{Naam} & \\textbf{\\#Maten} & \\textbf{Akkoorden (\\#mt)} \\\\\n");
    out.push_str("\\hline\n");
    for entry in &unique {
        let measures = entry
            .measures
            .map(|m| m.to_string())
            .unwrap_or_else(|| "?".to_string());
        let column = chord_column(chords.get(&entry.name), entry.measures);
        out.push_str(&format!(
            "{} & {} & {} \\\\\n",
            latex_escape(&entry.name),
            measures,
            latex_escape(&column)
        ));
    }
    out.push_str("\\hline\n");
    out.push_str("\\end{tabular}\n\n");

    out.push_str("\\subsection*{Compositie}\n\n");
    out.push_str("Compositie van het lied, met tussen haakjes het aantal maten:\n\n");
    out.push_str("\\vspace{0.3cm}\n\n");
    out.push_str("\\renewcommand{\\arraystretch}{1.3}  % some space between rows\n\n");
    out.push_str("\\begin{tabular}{l|l|c|p{8cm}}\n");
    out.push_str("\\hline\n");
    out.push_str(
        "\\textbf{Volgnr} & \\textbf{Deel} & \\textbf{\\#Maten} & \\textbf{Akkoorden(\\#mt)} \\\\\n",
    );
    out.push_str("\\hline\n");
    for (index, entry) in entries.iter().enumerate() {
        let measures = entry
            .measures
            .map(|m| m.to_string())
            .unwrap_or_else(|| "?".to_string());
        let spans = chords.get(&entry.name).map(Vec::as_slice).unwrap_or(&[]);
        out.push_str(&format!(
            "{} & {} & {} & {} \\\\\n",
            index + 1,
            latex_escape(&entry.name),
            measures,
            latex_escape(&format_timeline(spans))
        ));
    }
    out.push_str("\\hline\n");
    out.push_str("\\end{tabular}\n\n");
    out.push_str("\\end{document}\n");

    out
}

/// Label-track file: one `start\tstart\tname` line per section, starts in
/// seconds with six decimals. `None` when any start offset is unknown.
pub fn labeltrack(entries: &[SectionEntry]) -> Option<String> {
    let mut out = String::new();
    for entry in entries {
        let start = entry.start_seconds?;
        out.push_str(&format!("{start:.6}\t{start:.6}\t{}\n", entry.name));
    }
    Some(out)
}
