//! Fixed-capacity circular replay buffer for online training.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SimError};

use super::one_hot;

/// A stored state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// History-stacked state vector.
    pub state: Vec<f32>,
    /// One-hot encoded action.
    pub action: Vec<f32>,
    pub next_state: Vec<f32>,
    pub reward: f64,
    pub terminal: bool,
}

/// Replay buffer shape parameters.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Maximum number of stored transitions.
    pub capacity: usize,
    /// Length of the (already history-stacked) state vectors.
    pub state_size: usize,
    pub act_num: usize,
    pub minibatch_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            state_size: 2_500, // four stacked 625-value frames
            act_num: 5,
            minibatch_size: 32,
        }
    }
}

/// Column-wise minibatch of sampled transitions.
#[derive(Debug, Clone, Default)]
pub struct TransitionBatch {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub next_states: Vec<Vec<f32>>,
    pub rewards: Vec<f64>,
    pub terminals: Vec<bool>,
}

impl TransitionBatch {
    fn with_capacity(n: usize) -> Self {
        Self {
            states: Vec::with_capacity(n),
            actions: Vec::with_capacity(n),
            next_states: Vec::with_capacity(n),
            rewards: Vec::with_capacity(n),
            terminals: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, transition: &Transition) {
        self.states.push(transition.state.clone());
        self.actions.push(transition.action.clone());
        self.next_states.push(transition.next_state.clone());
        self.rewards.push(transition.reward);
        self.terminals.push(transition.terminal);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Arena of fixed-size slots plus head/len indices. Once full, the head
/// wraps and the oldest slot is overwritten; nothing is ever deleted.
#[derive(Debug)]
pub struct ReplayBuffer {
    config: ReplayConfig,
    slots: Vec<Transition>,
    head: usize,
    len: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(config: ReplayConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_rng(config: ReplayConfig, rng: StdRng) -> Result<Self> {
        if config.capacity == 0 {
            return Err(SimError::ZeroSize("capacity"));
        }
        if config.state_size == 0 {
            return Err(SimError::ZeroSize("state_size"));
        }
        if config.act_num == 0 {
            return Err(SimError::ZeroSize("act_num"));
        }
        if config.minibatch_size == 0 {
            return Err(SimError::ZeroSize("minibatch_size"));
        }
        Ok(Self {
            slots: Vec::with_capacity(config.capacity),
            head: 0,
            len: 0,
            config,
            rng,
        })
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store one transition, overwriting the oldest slot once the buffer
    /// is full.
    pub fn add(
        &mut self,
        state: Vec<f32>,
        action: usize,
        next_state: Vec<f32>,
        reward: f64,
        terminal: bool,
    ) -> Result<()> {
        if action >= self.config.act_num {
            return Err(SimError::LabelOutOfRange {
                label: action,
                act_num: self.config.act_num,
            });
        }
        let transition = Transition {
            state,
            action: one_hot(action, self.config.act_num),
            next_state,
            reward,
            terminal,
        };
        if self.slots.len() < self.config.capacity {
            self.slots.push(transition);
        } else {
            self.slots[self.head] = transition;
        }
        self.head = (self.head + 1) % self.config.capacity;
        self.len = (self.len + 1).min(self.config.capacity);
        Ok(())
    }

    /// Uniform sample with replacement over the logically valid window;
    /// duplicates within one minibatch are allowed. `None` uses the
    /// configured minibatch size. An empty buffer yields an empty batch.
    pub fn sample_minibatch(&mut self, size: Option<usize>) -> TransitionBatch {
        let size = size.unwrap_or(self.config.minibatch_size);
        if self.len == 0 {
            tracing::warn!("sampling from an empty replay buffer");
            return TransitionBatch::default();
        }

        let bottom = (self.head + self.config.capacity - self.len) % self.config.capacity;
        let mut batch = TransitionBatch::with_capacity(size);
        for _ in 0..size {
            let index = (bottom + self.rng.random_range(0..self.len)) % self.config.capacity;
            batch.push(&self.slots[index]);
        }
        batch
    }
}
