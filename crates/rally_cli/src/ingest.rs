//! Shot table CSV → `Vec<ShotEvent>`
//!
//! Required columns: `GameNumber`, `RallyNumber`, `StrokeNumber`,
//! `FrameNumber`, `Player`, `Stroke`.
//! Optional: `rally_id`, `effectiveness`, `is_serve`, and the rally outcome
//! as `rally_winner` or `is_winning_shot`/`is_losing_shot` flags.
//!
//! Rows that cannot become a shot (unknown player, non-numeric numbers,
//! annotation rows) are counted and skipped, never guessed.

use anyhow::{bail, Context, Result};
use rally_core::{Player, ShotEvent, ShotOutcome};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

const REQUIRED: [&str; 6] = [
    "GameNumber",
    "RallyNumber",
    "StrokeNumber",
    "FrameNumber",
    "Player",
    "Stroke",
];

/// Tokens accepted as strokes even without an underscore.
const STROKE_TOKENS: [&str; 7] = ["serve", "smash", "clear", "drop", "defense", "net", "lift"];

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    /// Rows with an unreadable field or unknown player
    pub failed: u32,
    /// Annotation rows removed by the stroke filter
    pub filtered: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Drop rows whose `Stroke` does not look like a stroke label
    pub filter_strokes: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            filter_strokes: true,
        }
    }
}

/// Underscore-joined labels, or a known stroke word.
pub fn is_valid_stroke(stroke: &str) -> bool {
    let s = stroke.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("none") {
        return false;
    }
    if s.contains('_') {
        return true;
    }
    let lower = s.to_lowercase();
    lower.split_whitespace().any(|tok| STROKE_TOKENS.contains(&tok))
}

fn parse_bool_like(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "t"
    )
}

struct Columns {
    game: usize,
    rally: usize,
    stroke_number: usize,
    frame: usize,
    player: usize,
    stroke: usize,
    rally_id: Option<usize>,
    effectiveness: Option<usize>,
    is_serve: Option<usize>,
    rally_winner: Option<usize>,
    winning_shot: Option<usize>,
    losing_shot: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        for name in REQUIRED {
            if find(name).is_none() {
                bail!("Missing required column: {}", name);
            }
        }
        let required = |name: &str| find(name).context("required column vanished");
        Ok(Self {
            game: required("GameNumber")?,
            rally: required("RallyNumber")?,
            stroke_number: required("StrokeNumber")?,
            frame: required("FrameNumber")?,
            player: required("Player")?,
            stroke: required("Stroke")?,
            rally_id: find("rally_id"),
            effectiveness: find("effectiveness"),
            is_serve: find("is_serve").or_else(|| find("isserve")),
            rally_winner: find("rally_winner").or_else(|| find("RallyWinner")),
            winning_shot: find("is_winning_shot").or_else(|| find("IsWinningShot")),
            losing_shot: find("is_losing_shot").or_else(|| find("IsLosingShot")),
        })
    }
}

/// Parse a numeric cell that may be written as a float (`12.0`).
fn parse_int(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn parse_u32(cell: &str) -> Option<u32> {
    parse_int(cell).and_then(|v| u32::try_from(v).ok())
}

/// Read shots from any CSV source.
pub fn read_shots<R: Read>(source: R, options: IngestOptions) -> Result<(Vec<ShotEvent>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let cols = Columns::resolve(&headers)?;

    let mut stats = ParseStats::default();
    let mut shots = Vec::new();

    for result in reader.records() {
        stats.total_rows += 1;
        let line = stats.total_rows + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                stats.failed += 1;
                log::warn!("Line {} - unreadable row: {}", line, e);
                continue;
            }
        };
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let stroke = cell(cols.stroke);
        if options.filter_strokes && !is_valid_stroke(stroke) {
            stats.filtered += 1;
            continue;
        }

        let (game, rally, stroke_number) = match (
            parse_u32(cell(cols.game)),
            parse_u32(cell(cols.rally)),
            parse_u32(cell(cols.stroke_number)),
        ) {
            (Some(g), Some(r), Some(s)) => (g, r, s),
            _ => {
                stats.failed += 1;
                log::warn!("Line {} - invalid game/rally/stroke numbers, skipping", line);
                continue;
            }
        };
        let Some(frame) = parse_int(cell(cols.frame)) else {
            stats.failed += 1;
            log::warn!("Line {} - invalid FrameNumber '{}', skipping", line, cell(cols.frame));
            continue;
        };
        let Some(player) = Player::from_token(cell(cols.player)) else {
            stats.failed += 1;
            log::warn!("Line {} - unknown player '{}', skipping", line, cell(cols.player));
            continue;
        };

        let rally_id = cols
            .rally_id
            .map(|i| cell(i).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{}_{}", game, rally));
        let effectiveness = cols
            .effectiveness
            .and_then(|i| cell(i).parse::<f64>().ok())
            .filter(|v| v.is_finite());
        let is_serve = match cols.is_serve {
            Some(i) => parse_bool_like(cell(i)),
            None => stroke.to_lowercase().contains("serve"),
        };

        let rally_winner = cols
            .rally_winner
            .map(|i| cell(i))
            .filter(|s| !s.is_empty())
            .and_then(|token| {
                let winner = Player::from_token(token);
                if winner.is_none() {
                    log::warn!("Line {} - unknown rally winner '{}', ignored", line, token);
                }
                winner
            });
        let flag = |col: Option<usize>| col.map_or(false, |i| parse_bool_like(cell(i)));
        let outcome = if flag(cols.winning_shot) {
            Some(ShotOutcome::Winner)
        } else if flag(cols.losing_shot) {
            Some(ShotOutcome::Error)
        } else {
            None
        };

        shots.push(ShotEvent {
            rally_id,
            game_number: game,
            rally_number: rally,
            stroke_number,
            frame_number: frame,
            player,
            stroke_category: stroke.to_string(),
            is_serve,
            effectiveness,
            rally_winner,
            outcome,
        });
        stats.parsed += 1;
    }

    shots.sort_by_key(|s| (s.game_number, s.rally_number, s.stroke_number));

    if stats.failed > 0 || stats.filtered > 0 {
        log::warn!(
            "{} rows skipped ({} unreadable, {} non-stroke)",
            stats.failed + stats.filtered,
            stats.failed,
            stats.filtered
        );
    }
    log::debug!("parsed {}/{} rows", stats.parsed, stats.total_rows);
    Ok((shots, stats))
}

/// Read shots from a CSV file.
pub fn read_shots_csv(path: &Path, options: IngestOptions) -> Result<(Vec<ShotEvent>, ParseStats)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_shots(file, options).with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}
