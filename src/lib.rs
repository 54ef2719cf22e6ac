//! Deterministic grid-world simulation core for navigation agents.
//!
//! A bot moves on a discretized obstacle grid toward a movable target. The
//! crate renders the world to 3-channel pixel frames with a cropped partial
//! observation, plans optimal routes with A*, replays them step-by-step as
//! expert trajectories, and packages the resulting observation stream into
//! history-stacked datasets and a circular replay buffer for training
//! consumers. Everything is single-threaded and reproducible under an
//! injected RNG seed.

pub mod error;
pub mod map;
pub mod pathfinding;
pub mod render;
pub mod simulator;
pub mod training;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Result, SimError};
pub use map::GridMap;
pub use pathfinding::{AStar, PlannedPath};
pub use render::Frame;
pub use simulator::{SimConfig, StepResult, WorldSimulator};
pub use training::{
    DatasetConfig, FrameRecord, HistoryDataset, RecentFrames, ReplayBuffer, ReplayConfig,
    RolloutConfig, Transition, TransitionBatch, collect_expert_records,
};
pub use types::{Action, Cell, Color};
