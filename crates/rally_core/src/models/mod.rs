//! Shot-level data model shared by the tempo and phase engines.

pub mod shot;

pub use shot::{
    group_rallies, Player, QualityBin, RallyOutcome, RallyShots, ShotEvent, ShotOutcome,
};
