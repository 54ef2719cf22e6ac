//! Transition tables consumed by training code.
//!
//! Two variants over the same observation stream: [`HistoryDataset`] builds
//! a supervised, history-stacked dataset from a finished expert rollout,
//! while [`ReplayBuffer`] is the online circular store for reinforcement
//! learning. [`collect_expert_records`] produces the flat rollout log both
//! of them consume.

pub mod dataset;
pub mod replay;
pub mod rollout;

pub use dataset::{DatasetConfig, FrameRecord, HistoryDataset, RecentFrames};
pub use replay::{ReplayBuffer, ReplayConfig, Transition, TransitionBatch};
pub use rollout::{RolloutConfig, collect_expert_records};

/// One-hot encode an action label. `label` must be below `act_num`.
pub fn one_hot(label: usize, act_num: usize) -> Vec<f32> {
    let mut row = vec![0.0; act_num];
    row[label] = 1.0;
    row
}

/// Recover the label from a one-hot row.
pub fn label_of(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
