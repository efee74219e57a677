//! Output writers: CSV tables and pretty JSON, each returning a SHA256
//! checksum of what was written.

use anyhow::{Context, Result};
use rally_core::analysis::stats::ComboStatistic;
use rally_core::analysis::tempo::{
    BaselineFamily, BaselineRow, ClassifiedResponse, RallyTempoSummary,
};
use rally_core::Player;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// `<prefix><suffix>`, e.g. `match1` + `_tempo_events.csv`.
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(checksum(bytes))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?;
    write_bytes(path, json.as_bytes())
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to encode CSV row for {}", path.display()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e))?;
    write_bytes(path, &bytes)
}

/// Flat CSV shape of a baseline row (the csv crate cannot flatten).
#[derive(Debug, Serialize)]
struct BaselineCsvRow<'a> {
    family: BaselineFamily,
    key: &'a str,
    player: Player,
    usable: bool,
    count: usize,
    median: f64,
    p10: Option<f64>,
    p90: Option<f64>,
    median_absolute_deviation: f64,
}

impl<'a> From<&'a BaselineRow> for BaselineCsvRow<'a> {
    fn from(row: &'a BaselineRow) -> Self {
        let ComboStatistic {
            count,
            median,
            p10,
            p90,
            median_absolute_deviation,
        } = row.stats;
        Self {
            family: row.family,
            key: &row.key,
            player: row.player,
            usable: row.usable,
            count,
            median,
            p10,
            p90,
            median_absolute_deviation,
        }
    }
}

pub fn write_events_csv(path: &Path, responses: &[ClassifiedResponse]) -> Result<String> {
    write_csv(path, responses)
}

pub fn write_rally_summary_csv(path: &Path, rows: &[RallyTempoSummary]) -> Result<String> {
    write_csv(path, rows)
}

pub fn write_baselines_csv(path: &Path, rows: &[BaselineRow]) -> Result<String> {
    let flat: Vec<BaselineCsvRow<'_>> = rows.iter().map(BaselineCsvRow::from).collect();
    write_csv(path, &flat)
}
