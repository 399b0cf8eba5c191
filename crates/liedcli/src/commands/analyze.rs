//! The `analyze` subcommand: structural analysis of one song file.

use anyhow::{bail, Context, Result};
use liedconf::LiedConfig;
use nwctxt::analyze::analyze;
use nwctxt::report::{analysis_report, song_number};
use nwctxt::timing::TimeSig;
use nwctxt::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolve a song title or path to a file. Anything that looks like a path
/// is used as-is; a bare title gets the `.nwctxt` extension and is looked
/// up in the build dir.
pub fn resolve_input(input: &str, config: &LiedConfig) -> Result<PathBuf> {
    let as_path = Path::new(input);
    if input.contains(std::path::MAIN_SEPARATOR) || as_path.exists() {
        return Ok(as_path.to_path_buf());
    }

    let mut name = input.to_string();
    if !name.ends_with(".nwctxt") {
        name.push_str(".nwctxt");
    }
    let candidate = config.paths.build_dir.join(&name);
    if candidate.exists() {
        Ok(candidate)
    } else {
        bail!("file not found in build dir: {}", candidate.display());
    }
}

pub fn run(
    config: &LiedConfig,
    input: &str,
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
) -> Result<()> {
    let path = resolve_input(input, config)?;
    let document = Document::from_path(&path)?;
    write_report(config, &path, &document, tempo, timesig)?;
    Ok(())
}

/// Analyze a document and write `<stem> analysis.txt` to the build dir.
pub fn write_report(
    config: &LiedConfig,
    path: &Path,
    document: &Document,
    tempo: Option<u32>,
    timesig: Option<TimeSig>,
) -> Result<PathBuf> {
    let result = analyze(document, tempo, timesig);
    for feedback in &result.feedback {
        warn!("{feedback}");
    }
    let Some(analysis) = result.value else {
        bail!("analysis failed for {}", path.display());
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("onbekend");
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("onbekend");
    let location = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let number = song_number(stem);

    let report = analysis_report(&analysis, file_name, &location, number.as_deref());

    fs::create_dir_all(&config.paths.build_dir).with_context(|| {
        format!(
            "creating build dir {}",
            config.paths.build_dir.display()
        )
    })?;
    let output = config.paths.build_dir.join(format!("{stem} analysis.txt"));
    fs::write(&output, report)
        .with_context(|| format!("writing analysis to {}", output.display()))?;

    info!(
        path = %output.display(),
        measures = analysis.total_measures,
        "wrote analysis"
    );
    Ok(output)
}
