//! Library error types.

use thiserror::Error;

use crate::types::Cell;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("unknown map index {0}")]
    UnknownMap(usize),

    #[error("malformed map: {0}")]
    InvalidMap(String),

    #[error("cube size must be at least 1")]
    ZeroCubeSize,

    #[error("partial observation size must be odd, got {0}")]
    EvenObservationSize(usize),

    #[error("partial observation radius {radius} exceeds the map's free-cell margin {margin}")]
    ObservationTooWide { radius: i32, margin: i32 },

    #[error("target cell {0} is not a free cell")]
    TargetBlocked(Cell),

    #[error("no path from {start} to {goal}")]
    PathNotFound { start: Cell, goal: Cell },

    #[error("expert plan is exhausted")]
    PlanExhausted,

    #[error("no episode has been started")]
    EpisodeNotStarted,

    #[error("{0} must be at least 1")]
    ZeroSize(&'static str),

    #[error("record log is empty")]
    EmptyDataset,

    #[error("frame {index} has length {len}, expected {expected}")]
    FrameSizeMismatch {
        index: usize,
        len: usize,
        expected: usize,
    },

    #[error("validation split of {valid} leaves no training data out of {total} examples")]
    SplitTooLarge { valid: usize, total: usize },

    #[error("minibatch size {minibatch} exceeds training set size {train}")]
    MinibatchTooLarge { minibatch: usize, train: usize },

    #[error("action label {label} is outside the action set of size {act_num}")]
    LabelOutOfRange { label: usize, act_num: usize },
}
