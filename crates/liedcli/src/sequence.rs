//! Song sequence ("volgorde") file: the ordered list of section names that
//! make up a complete song.
//!
//! ```toml
//! songstructure = ["intro", "couplet", "refrein", "couplet", "refrein"]
//! ```

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Sequence {
    /// Section names in performance order; repeats are allowed.
    pub songstructure: Vec<String>,
}

pub fn load(path: &Path) -> Result<Sequence> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading sequence file {}", path.display()))?;
    let sequence: Sequence = toml::from_str(&contents)
        .with_context(|| format!("parsing sequence file {}", path.display()))?;
    ensure!(
        !sequence.songstructure.is_empty(),
        "sequence file {} lists no sections",
        path.display()
    );
    Ok(sequence)
}
