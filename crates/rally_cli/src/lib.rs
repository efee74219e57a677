//! Rally CLI Library
//!
//! CSV shot tables → tempo tables, phase JSON and full match analyses.
//! Matches are independent, so `analyze` fans out across inputs with rayon.

pub mod ingest;
pub mod output;

use anyhow::{Context, Result};
use rally_core::analysis::tempo::TempoAnalysis;
use rally_core::models::group_rallies;
use rally_core::{
    analyze_match, segment_match, AnalysisConfig, CategoryTable, KeywordBucketer, ShotBucketer,
    TacticalCategory, SCHEMA_VERSION,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ingest::{is_valid_stroke, read_shots, read_shots_csv, IngestOptions, ParseStats};
pub use output::{checksum, with_suffix};

/// Shot bucketing chosen at startup: an explicit table or the keyword heuristic.
#[derive(Debug, Clone)]
pub enum Bucketer {
    Table(CategoryTable),
    Keywords(KeywordBucketer),
}

impl Default for Bucketer {
    fn default() -> Self {
        Bucketer::Keywords(KeywordBucketer)
    }
}

impl ShotBucketer for Bucketer {
    fn bucket(&self, stroke: &str) -> TacticalCategory {
        match self {
            Bucketer::Table(t) => t.bucket(stroke),
            Bucketer::Keywords(k) => k.bucket(stroke),
        }
    }
}

/// Load an analysis config: JSON when the extension is `.json`, YAML otherwise.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let config: AnalysisConfig = if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON config: {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML config: {}", path.display()))?
    };
    config
        .validate()
        .with_context(|| format!("Rejected config: {}", path.display()))?;
    Ok(config)
}

pub fn load_categories(path: &Path) -> Result<CategoryTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read category file: {}", path.display()))?;
    CategoryTable::from_json(&text)
        .with_context(|| format!("Invalid category file: {}", path.display()))
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: AnalysisConfig,
    pub bucketer: Bucketer,
    pub ingest: IngestOptions,
    /// Output prefix; defaults to the input path without its extension
    pub out_prefix: Option<PathBuf>,
}

impl RunOptions {
    fn prefix_for(&self, input: &Path, multiple: bool) -> PathBuf {
        let stem = input.with_extension("");
        match &self.out_prefix {
            Some(prefix) if multiple => {
                let name = stem.file_name().map(|n| n.to_os_string()).unwrap_or_default();
                let mut joined = prefix.as_os_str().to_os_string();
                joined.push("_");
                joined.push(name);
                PathBuf::from(joined)
            }
            Some(prefix) => prefix.clone(),
            None => stem,
        }
    }
}

/// One written file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// SHA256 (hex)
    pub checksum: String,
}

#[derive(Debug, Serialize)]
struct ThresholdsReport<'a> {
    schema_version: u8,
    tempo: &'a rally_core::config::TempoConfig,
    quality: &'a rally_core::config::QualityBinConfig,
    fallback_order: Vec<&'static str>,
    threshold_sources: Vec<(&'static str, usize)>,
    baselines: Vec<rally_core::analysis::tempo::BaselineRow>,
    serve_receive: Vec<rally_core::analysis::tempo::ServeReceiveSummary>,
    combo_patterns: Vec<rally_core::analysis::tempo::ComboPattern>,
    highlights: Vec<rally_core::analysis::tempo::HighlightEvent>,
}

/// `tempo`: events CSV, rally summary CSV, combo stats CSV, thresholds JSON
/// and the combo fast/slow timing JSON.
pub fn run_tempo(input: &Path, options: &RunOptions) -> Result<Vec<OutputFile>> {
    let config = &options.config;
    config.validate().context("Invalid analysis config")?;
    let (shots, _stats) = read_shots_csv(input, options.ingest)?;
    let rallies = group_rallies(&shots)
        .with_context(|| format!("Invalid shot order in {}", input.display()))?;

    let tempo = TempoAnalysis::run(&rallies, config);
    let prefix = options.prefix_for(input, false);

    let report = ThresholdsReport {
        schema_version: SCHEMA_VERSION,
        tempo: &config.tempo,
        quality: &config.quality,
        fallback_order: rally_core::FALLBACK_ORDER.iter().map(|f| f.as_str()).collect(),
        threshold_sources: tempo
            .source_counts()
            .into_iter()
            .map(|(f, n)| (f.as_str(), n))
            .collect(),
        baselines: tempo.baselines.rows(),
        serve_receive: tempo.serve_receive(),
        combo_patterns: tempo.combo_patterns(config),
        highlights: tempo.highlights(config),
    };

    let mut written = Vec::new();
    let mut record = |path: PathBuf, checksum: String| {
        written.push(OutputFile { path, checksum });
    };

    let path = with_suffix(&prefix, "_tempo_events.csv");
    let sum = output::write_events_csv(&path, &tempo.responses)?;
    record(path, sum);

    let path = with_suffix(&prefix, "_tempo_rally_summary.csv");
    let sum = output::write_rally_summary_csv(&path, &tempo.rally_summaries())?;
    record(path, sum);

    let path = with_suffix(&prefix, "_tempo_combo_stats.csv");
    let sum = output::write_baselines_csv(&path, &report.baselines)?;
    record(path, sum);

    let path = with_suffix(&prefix, "_tempo_thresholds.json");
    let sum = output::write_json(&path, &report)?;
    record(path, sum);

    let path = with_suffix(&prefix, "_tempo_combo_fast_slow.json");
    let sum = output::write_json(&path, &tempo.combo_fast_slow(config))?;
    record(path, sum);

    Ok(written)
}

/// `phases`: phases, turning points and narrative for every rally and player.
pub fn run_phases(input: &Path, options: &RunOptions) -> Result<OutputFile> {
    options.config.validate().context("Invalid analysis config")?;
    let (shots, _stats) = read_shots_csv(input, options.ingest)?;
    let rallies = group_rallies(&shots)
        .with_context(|| format!("Invalid shot order in {}", input.display()))?;
    let phases = segment_match(&rallies, &options.bucketer, &options.config.phase);

    let path = with_suffix(&options.prefix_for(input, false), "_phases.json");
    let checksum = output::write_json(&path, &phases)?;
    Ok(OutputFile { path, checksum })
}

/// Per-input record of an `analyze` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub input: PathBuf,
    pub output: OutputFile,
    pub shot_count: usize,
    pub rally_count: usize,
    pub rows_total: u32,
    pub rows_skipped: u32,
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub tool_version: String,
    pub core_version: String,
    pub schema_version: u8,
    /// RFC3339
    pub created_at: String,
    pub config: AnalysisConfig,
    pub matches: Vec<MatchRecord>,
}

fn analyze_one(input: &Path, options: &RunOptions, multiple: bool) -> Result<MatchRecord> {
    let (shots, stats) = read_shots_csv(input, options.ingest)?;
    let analysis = analyze_match(&shots, &options.config, &options.bucketer)
        .with_context(|| format!("Analysis failed for {}", input.display()))?;

    let path = with_suffix(&options.prefix_for(input, multiple), "_analysis.json");
    let checksum = output::write_json(&path, &analysis)?;
    Ok(MatchRecord {
        input: input.to_path_buf(),
        output: OutputFile { path, checksum },
        shot_count: analysis.shot_count,
        rally_count: analysis.rally_count,
        rows_total: stats.total_rows,
        rows_skipped: stats.failed + stats.filtered,
    })
}

/// `analyze`: full `MatchAnalysis` JSON per input, matches in parallel.
///
/// Fails on the first input that fails; outputs already written stay.
pub fn run_analyze(inputs: &[PathBuf], options: &RunOptions) -> Result<RunMetadata> {
    options.config.validate().context("Invalid analysis config")?;
    let multiple = inputs.len() > 1;

    let matches = inputs
        .par_iter()
        .map(|input| analyze_one(input, options, multiple))
        .collect::<Result<Vec<_>>>()?;

    Ok(RunMetadata {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        core_version: rally_core::VERSION.to_string(),
        schema_version: SCHEMA_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        config: options.config.clone(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const MATCH: &str = "\
GameNumber,RallyNumber,StrokeNumber,FrameNumber,Player,Stroke,effectiveness
1,1,1,0,P0,serve_short,
1,1,2,27,P1,backhand_lift,62
1,1,3,61,P0,forehand_smash,85
1,1,4,80,P1,backhand_defense,40
1,1,5,112,P0,forehand_smash,78
1,2,1,900,P1,serve_long,
1,2,2,935,P0,forehand_clear,55
1,2,3,972,P1,forehand_drop,70
";

    fn write_match(dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, MATCH)?;
        Ok(path)
    }

    #[test]
    fn test_tempo_writes_all_outputs() -> Result<()> {
        let dir = tempdir()?;
        let input = write_match(dir.path(), "m1.csv")?;
        let written = run_tempo(&input, &RunOptions::default())?;

        let names: Vec<String> = written
            .iter()
            .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "m1_tempo_events.csv",
                "m1_tempo_rally_summary.csv",
                "m1_tempo_combo_stats.csv",
                "m1_tempo_thresholds.json",
                "m1_tempo_combo_fast_slow.json",
            ]
        );
        for o in &written {
            let bytes = fs::read(&o.path)?;
            assert_eq!(checksum(&bytes), o.checksum);
        }

        let events = fs::read_to_string(dir.path().join("m1_tempo_events.csv"))?;
        // header + 6 responses
        assert_eq!(events.lines().count(), 7);
        assert!(events.lines().next().unwrap().contains("threshold_source"));

        let thresholds: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("m1_tempo_thresholds.json"))?)?;
        assert_eq!(thresholds["fallback_order"][0], "combo_with_quality");
        Ok(())
    }

    #[test]
    fn test_phases_with_out_prefix() -> Result<()> {
        let dir = tempdir()?;
        let input = write_match(dir.path(), "m1.csv")?;
        let options = RunOptions {
            out_prefix: Some(dir.path().join("out").join("custom")),
            ..RunOptions::default()
        };
        let out = run_phases(&input, &options)?;
        assert!(out.path.ends_with("out/custom_phases.json"));

        let phases: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out.path)?)?;
        // 2 rallies x 2 players
        assert_eq!(phases.as_array().unwrap().len(), 4);
        // no outcome columns in the table
        assert_eq!(phases[0]["result"], serde_json::Value::Null);
        assert!(phases[0]["narrative"]
            .as_str()
            .unwrap()
            .ends_with("Result: UNKNOWN"));
        Ok(())
    }

    #[test]
    fn test_analyze_many_in_parallel() -> Result<()> {
        let dir = tempdir()?;
        let inputs = vec![
            write_match(dir.path(), "a.csv")?,
            write_match(dir.path(), "b.csv")?,
        ];
        let options = RunOptions {
            out_prefix: Some(dir.path().join("run")),
            ..RunOptions::default()
        };
        let meta = run_analyze(&inputs, &options)?;
        assert_eq!(meta.matches.len(), 2);
        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        assert!(meta.matches[0].output.path.ends_with("run_a_analysis.json"));
        assert!(meta.matches[1].output.path.ends_with("run_b_analysis.json"));
        assert_eq!(meta.matches[0].output.checksum, meta.matches[1].output.checksum);
        assert_eq!(meta.matches[0].shot_count, 8);
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.created_at).is_ok());
        Ok(())
    }

    #[test]
    fn test_load_config_yaml_and_json() -> Result<()> {
        let dir = tempdir()?;
        let yaml = dir.path().join("rally.yaml");
        fs::write(&yaml, "tempo:\n  fps: 60.0\n  min_combo_n: 10\nphase:\n  min_phase_length: 3\n")?;
        let cfg = load_config(&yaml)?;
        assert_eq!(cfg.tempo.fps, 60.0);
        assert_eq!(cfg.tempo.min_combo_n, 10);
        assert_eq!(cfg.phase.min_phase_length, 3);

        let json = dir.path().join("rally.json");
        fs::write(&json, r#"{"tempo": {"fps": 0}}"#)?;
        assert!(load_config(&json).is_err());
        Ok(())
    }

    #[test]
    fn test_table_bucketer() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(br#"{"shot_categories": {"attacking_shots": ["forehand_smash"]}}"#)?;
        let bucketer = Bucketer::Table(load_categories(file.path())?);
        assert_eq!(bucketer.bucket("forehand_smash_cross"), TacticalCategory::Attacking);
        assert_eq!(bucketer.bucket("backhand_lift"), TacticalCategory::Other);
        assert_eq!(Bucketer::default().bucket("backhand_lift"), TacticalCategory::Reset);
        Ok(())
    }
}
