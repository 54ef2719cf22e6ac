//! Expert rollout collection: replay planner actions on the simulator and
//! log the per-step observations for dataset building.

use crate::error::Result;
use crate::simulator::WorldSimulator;
use crate::types::Cell;

use super::dataset::FrameRecord;

/// Rollout loop parameters.
#[derive(Debug, Clone)]
pub struct RolloutConfig {
    /// Total number of records to collect.
    pub steps: usize,
    /// Per-episode step cap; the episode is abandoned past it.
    pub early_stop: usize,
    /// Fixed target cell, or `None` to randomize every episode.
    pub target: Option<Cell>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            steps: 10_000,
            early_stop: 50,
            target: None,
        }
    }
}

/// Replay expert episodes on `sim`, recording the grayscale partial
/// observation after every step together with the action that produced it
/// and an episode-start flag for the reset states.
pub fn collect_expert_records(
    sim: &mut WorldSimulator,
    config: &RolloutConfig,
) -> Result<Vec<FrameRecord>> {
    let mut records = Vec::with_capacity(config.steps);
    let mut state = sim.new_episode(config.target)?;
    let mut fresh = true;
    let mut epi_step = 0usize;
    let mut episodes = 1usize;

    for _ in 0..config.steps {
        if state.terminal || epi_step >= config.early_stop {
            state = sim.new_episode(config.target)?;
            fresh = true;
            epi_step = 0;
            episodes += 1;
        } else {
            state = sim.step(None)?;
            fresh = false;
        }
        records.push(FrameRecord {
            frame: state.pob.to_gray(),
            action: state.action,
            episode_start: fresh,
        });
        epi_step += 1;
    }

    tracing::info!(records = records.len(), episodes, "expert rollout collected");
    Ok(records)
}
