//! History-stacked training dataset built from expert rollout logs.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, SimError};
use crate::types::Action;

use super::one_hot;

/// One logged frame of an expert rollout.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Flattened grayscale observation.
    pub frame: Vec<f32>,
    /// The action that produced this frame.
    pub action: Action,
    /// True when this frame is the first of a fresh episode. An explicit
    /// flag, so a genuine mid-episode `Stay` never resets the history.
    pub episode_start: bool,
}

/// Dataset shape parameters.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Length of a single flattened frame.
    pub state_size: usize,
    /// Width of the one-hot label rows.
    pub act_num: usize,
    /// Number of consecutive frames stacked into one example.
    pub hist_len: usize,
    pub minibatch_size: usize,
    /// Number of examples held out for validation.
    pub valid_size: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            state_size: 625, // 5-cell window at 5 px per cell, squared
            act_num: Action::COUNT,
            hist_len: 4,
            minibatch_size: 32,
            valid_size: 128,
        }
    }
}

/// Supervised dataset of history-stacked states with next-action labels,
/// split into disjoint training and validation sets.
#[derive(Debug)]
pub struct HistoryDataset {
    config: DatasetConfig,
    train_states: Vec<Vec<f32>>,
    train_labels: Vec<Vec<f32>>,
    valid_states: Vec<Vec<f32>>,
    valid_labels: Vec<Vec<f32>>,
    minibatch_order: Vec<usize>,
    minibatch_index: usize,
    rng: StdRng,
}

impl HistoryDataset {
    pub fn build(records: &[FrameRecord], config: DatasetConfig) -> Result<Self> {
        Self::build_with_rng(records, config, StdRng::from_os_rng())
    }

    pub fn build_with_rng(
        records: &[FrameRecord],
        config: DatasetConfig,
        mut rng: StdRng,
    ) -> Result<Self> {
        validate(records, &config)?;

        // The log stores the action that *produced* each frame; training
        // needs the action to take *from* it. Shift left by one and pad the
        // tail with a terminal `Stay`.
        let labels: Vec<usize> = records
            .iter()
            .skip(1)
            .map(|r| r.action.index())
            .chain(std::iter::once(Action::Stay.index()))
            .collect();

        let mut states = stack_history(records, &config);

        let mut order: Vec<usize> = (0..records.len()).collect();
        order.shuffle(&mut rng);
        let train_size = records.len() - config.valid_size;

        let mut train_states = Vec::with_capacity(train_size);
        let mut train_labels = Vec::with_capacity(train_size);
        let mut valid_states = Vec::with_capacity(config.valid_size);
        let mut valid_labels = Vec::with_capacity(config.valid_size);
        for (slot, &i) in order.iter().enumerate() {
            let state = std::mem::take(&mut states[i]);
            let label = one_hot(labels[i], config.act_num);
            if slot < train_size {
                train_states.push(state);
                train_labels.push(label);
            } else {
                valid_states.push(state);
                valid_labels.push(label);
            }
        }

        tracing::info!(
            examples = records.len(),
            hist_len = config.hist_len,
            train = train_size,
            valid = config.valid_size,
            "dataset built"
        );

        Ok(Self {
            config,
            train_states,
            train_labels,
            valid_states,
            valid_labels,
            minibatch_order: Vec::new(),
            minibatch_index: 0,
            rng,
        })
    }

    pub fn train_len(&self) -> usize {
        self.train_states.len()
    }

    pub fn valid_len(&self) -> usize {
        self.valid_states.len()
    }

    pub fn training_set(&self) -> (&[Vec<f32>], &[Vec<f32>]) {
        (&self.train_states, &self.train_labels)
    }

    pub fn validation_set(&self) -> (&[Vec<f32>], &[Vec<f32>]) {
        (&self.valid_states, &self.valid_labels)
    }

    /// Minibatches per epoch; the partial tail batch is dropped.
    pub fn minibatches_per_epoch(&self) -> usize {
        self.train_states.len() / self.config.minibatch_size
    }

    /// Next contiguous slice of the per-epoch shuffled order. The order is
    /// reshuffled once at the start of every epoch.
    pub fn next_minibatch(&mut self) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        if self.minibatch_index == 0 {
            self.minibatch_order = (0..self.train_states.len()).collect();
            self.minibatch_order.shuffle(&mut self.rng);
        }
        let n = self.config.minibatch_size;
        let offset = self.minibatch_index * n;
        let ind = &self.minibatch_order[offset..offset + n];
        let states = ind.iter().map(|&i| self.train_states[i].clone()).collect();
        let labels = ind.iter().map(|&i| self.train_labels[i].clone()).collect();
        self.minibatch_index = (self.minibatch_index + 1) % self.minibatches_per_epoch();
        (states, labels)
    }
}

fn validate(records: &[FrameRecord], config: &DatasetConfig) -> Result<()> {
    if records.is_empty() {
        return Err(SimError::EmptyDataset);
    }
    if config.hist_len == 0 {
        return Err(SimError::ZeroSize("hist_len"));
    }
    if config.minibatch_size == 0 {
        return Err(SimError::ZeroSize("minibatch_size"));
    }
    if config.act_num == 0 {
        return Err(SimError::ZeroSize("act_num"));
    }
    for (index, record) in records.iter().enumerate() {
        if record.frame.len() != config.state_size {
            return Err(SimError::FrameSizeMismatch {
                index,
                len: record.frame.len(),
                expected: config.state_size,
            });
        }
        let label = record.action.index();
        if label >= config.act_num {
            return Err(SimError::LabelOutOfRange {
                label,
                act_num: config.act_num,
            });
        }
    }
    if config.valid_size >= records.len() {
        return Err(SimError::SplitTooLarge {
            valid: config.valid_size,
            total: records.len(),
        });
    }
    let train = records.len() - config.valid_size;
    if config.minibatch_size > train {
        return Err(SimError::MinibatchTooLarge {
            minibatch: config.minibatch_size,
            train,
        });
    }
    Ok(())
}

fn stack_history(records: &[FrameRecord], config: &DatasetConfig) -> Vec<Vec<f32>> {
    let mut history: VecDeque<&[f32]> = VecDeque::with_capacity(config.hist_len + 1);
    let mut states = Vec::with_capacity(records.len());
    for record in records {
        // A boundary (and a log that does not open with one) starts the
        // history from `hist_len` copies of the current frame; nothing
        // bleeds across episodes.
        if record.episode_start || history.is_empty() {
            history.clear();
            for _ in 0..config.hist_len {
                history.push_back(record.frame.as_slice());
            }
        } else {
            history.push_back(record.frame.as_slice());
            if history.len() > config.hist_len {
                history.pop_front();
            }
        }

        let mut stacked = Vec::with_capacity(config.hist_len * config.state_size);
        for frame in &history {
            stacked.extend_from_slice(frame);
        }
        states.push(stacked);
    }
    states
}

/// Rolling frame history for inference-time consumers, with the same reset
/// rule as the dataset builder.
#[derive(Debug, Clone)]
pub struct RecentFrames {
    hist_len: usize,
    state_size: usize,
    frames: VecDeque<Vec<f32>>,
}

impl RecentFrames {
    pub fn new(hist_len: usize, state_size: usize) -> Result<Self> {
        if hist_len == 0 {
            return Err(SimError::ZeroSize("hist_len"));
        }
        if state_size == 0 {
            return Err(SimError::ZeroSize("state_size"));
        }
        let frames = (0..hist_len).map(|_| vec![0.0; state_size]).collect();
        Ok(Self {
            hist_len,
            state_size,
            frames,
        })
    }

    pub fn push(&mut self, frame: Vec<f32>, episode_start: bool) {
        if episode_start {
            self.frames.clear();
            for _ in 0..self.hist_len {
                self.frames.push_back(frame.clone());
            }
        } else {
            self.frames.push_back(frame);
            if self.frames.len() > self.hist_len {
                self.frames.pop_front();
            }
        }
    }

    /// Flattened stacked history, oldest frame first.
    pub fn stacked(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.hist_len * self.state_size);
        for frame in &self.frames {
            out.extend_from_slice(frame);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fill: f32, action: Action, episode_start: bool) -> FrameRecord {
        FrameRecord {
            frame: vec![fill, fill],
            action,
            episode_start,
        }
    }

    fn config(valid_size: usize) -> DatasetConfig {
        DatasetConfig {
            state_size: 2,
            act_num: Action::COUNT,
            hist_len: 2,
            minibatch_size: 1,
            valid_size,
        }
    }

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Two episodes of distinct frames: the stack must restart from the
    /// boundary frame alone.
    #[test]
    fn boundaries_reset_the_stack() {
        let records = vec![
            record(1.0, Action::Stay, true),
            record(2.0, Action::Right, false),
            record(3.0, Action::Right, false),
            record(4.0, Action::Stay, true),
            record(5.0, Action::Down, false),
        ];
        let states = stack_history(&records, &config(0));

        assert_eq!(states[0], vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(states[1], vec![1.0, 1.0, 2.0, 2.0]);
        assert_eq!(states[2], vec![2.0, 2.0, 3.0, 3.0]);
        // No bleed from the first episode.
        assert_eq!(states[3], vec![4.0, 4.0, 4.0, 4.0]);
        assert_eq!(states[4], vec![4.0, 4.0, 5.0, 5.0]);
    }

    #[test]
    fn mid_episode_stay_does_not_reset() {
        let records = vec![
            record(1.0, Action::Stay, true),
            record(2.0, Action::Right, false),
            record(2.0, Action::Stay, false),
        ];
        let states = stack_history(&records, &config(0));
        assert_eq!(states[2], vec![2.0, 2.0, 2.0, 2.0]);
        assert_ne!(states[2], vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn labels_are_shifted_to_the_next_action() {
        let records = vec![
            record(1.0, Action::Stay, true),
            record(2.0, Action::Right, false),
            record(3.0, Action::Down, false),
        ];
        let dataset =
            HistoryDataset::build_with_rng(&records, config(0), seeded(11)).unwrap();

        let (states, labels) = dataset.training_set();
        assert_eq!(dataset.train_len(), 3);
        // Rows are shuffled; locate each example by its newest frame.
        for (state, label) in states.iter().zip(labels) {
            let newest = state[state.len() - 1];
            let expected = match newest as u32 {
                1 => Action::Right, // from frame 1 the expert moved right
                2 => Action::Down,
                3 => Action::Stay, // terminal placeholder
                other => panic!("unexpected frame tag {other}"),
            };
            assert_eq!(crate::training::label_of(label), expected.index());
        }
    }

    #[test]
    fn split_is_disjoint_and_sized() {
        let records: Vec<FrameRecord> = (0..10)
            .map(|i| record(i as f32, Action::Right, i == 0))
            .collect();
        let dataset =
            HistoryDataset::build_with_rng(&records, config(3), seeded(12)).unwrap();

        assert_eq!(dataset.train_len(), 7);
        assert_eq!(dataset.valid_len(), 3);

        let (train, _) = dataset.training_set();
        let (valid, _) = dataset.validation_set();
        for state in valid {
            assert!(!train.contains(state));
        }
    }

    #[test]
    fn minibatches_cover_an_epoch_without_repeats() {
        let records: Vec<FrameRecord> = (0..9)
            .map(|i| record(i as f32, Action::Right, i == 0))
            .collect();
        let mut cfg = config(0);
        cfg.minibatch_size = 3;
        let mut dataset = HistoryDataset::build_with_rng(&records, cfg, seeded(13)).unwrap();

        assert_eq!(dataset.minibatches_per_epoch(), 3);
        let mut seen = Vec::new();
        for _ in 0..dataset.minibatches_per_epoch() {
            let (states, labels) = dataset.next_minibatch();
            assert_eq!(states.len(), 3);
            assert_eq!(labels.len(), 3);
            seen.extend(states);
        }
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen.dedup();
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn shape_errors_are_reported() {
        let records = vec![record(1.0, Action::Stay, true)];
        assert_eq!(
            HistoryDataset::build_with_rng(&[], config(0), seeded(14)).unwrap_err(),
            SimError::EmptyDataset
        );
        assert_eq!(
            HistoryDataset::build_with_rng(&records, config(1), seeded(14)).unwrap_err(),
            SimError::SplitTooLarge { valid: 1, total: 1 }
        );

        let mut bad = config(0);
        bad.state_size = 9;
        assert_eq!(
            HistoryDataset::build_with_rng(&records, bad, seeded(14)).unwrap_err(),
            SimError::FrameSizeMismatch {
                index: 0,
                len: 2,
                expected: 9
            }
        );

        let mut bad = config(0);
        bad.hist_len = 0;
        assert_eq!(
            HistoryDataset::build_with_rng(&records, bad, seeded(14)).unwrap_err(),
            SimError::ZeroSize("hist_len")
        );

        let mut bad = config(0);
        bad.minibatch_size = 2;
        assert_eq!(
            HistoryDataset::build_with_rng(&records, bad, seeded(14)).unwrap_err(),
            SimError::MinibatchTooLarge {
                minibatch: 2,
                train: 1
            }
        );
    }

    #[test]
    fn recent_frames_roll_and_reset() {
        let mut recent = RecentFrames::new(2, 1).unwrap();
        assert_eq!(recent.stacked(), vec![0.0, 0.0]);

        recent.push(vec![1.0], true);
        assert_eq!(recent.stacked(), vec![1.0, 1.0]);

        recent.push(vec![2.0], false);
        assert_eq!(recent.stacked(), vec![1.0, 2.0]);

        recent.push(vec![3.0], false);
        assert_eq!(recent.stacked(), vec![2.0, 3.0]);

        recent.push(vec![4.0], true);
        assert_eq!(recent.stacked(), vec![4.0, 4.0]);
    }
}
