//! The `stems` subcommand: one solo copy of the document per named staff,
//! ready for an external synthesis pipeline to render.

use crate::commands::analyze::resolve_input;
use anyhow::{bail, Context, Result};
use liedconf::LiedConfig;
use nwctxt::Document;
use std::fs;
use tracing::{info, warn};

pub fn run(config: &LiedConfig, input: &str, staves: &[String]) -> Result<()> {
    let path = resolve_input(input, config)?;
    let document = Document::from_path(&path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("onbekend")
        .to_string();

    let solos = document.solo_documents(config.defaults.mute_volume);
    if solos.is_empty() {
        bail!("no named staves in {}", path.display());
    }

    for wanted in staves {
        if !solos.iter().any(|(name, _)| name == wanted) {
            warn!(staff = %wanted, "staff not found in document");
        }
    }
    let selected: Vec<_> = if staves.is_empty() {
        solos
    } else {
        solos
            .into_iter()
            .filter(|(name, _)| staves.contains(name))
            .collect()
    };
    if selected.is_empty() {
        bail!("none of the requested staves exist in {}", path.display());
    }

    fs::create_dir_all(&config.paths.audio_dir).with_context(|| {
        format!("creating audio dir {}", config.paths.audio_dir.display())
    })?;

    for (name, solo) in &selected {
        if let Some(staff) = solo.staff_by_name(name) {
            if !staff.has_playback_properties() {
                warn!(staff = %name, "no playback properties line, mute state unchanged");
            }
        }
        let output = config.paths.audio_dir.join(format!("{stem} {name}.nwctxt"));
        solo.write_to_path(&output)?;
        info!(path = %output.display(), staff = %name, "wrote solo copy");
    }

    Ok(())
}
