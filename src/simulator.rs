//! Grid-world simulator: episode state machine, movement and collision
//! rules, reward assignment, and frame rendering.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SimError};
use crate::map::GridMap;
use crate::pathfinding::{AStar, PlannedPath};
use crate::render::Frame;
use crate::types::{Action, Cell, Color};

/// Reward for stepping onto the target cell.
pub const TARGET_REWARD: f64 = 1.0;
/// Reward for a move absorbed by an obstacle.
pub const COLLISION_REWARD: f64 = -1.0;
/// Per-step cost of every other move.
pub const STEP_REWARD: f64 = -0.04;

// One reserved channel per object kind; overlapping draws never corrupt
// the other layers.
const OBSTACLE_COLOR: Color = Color::Red;
const TARGET_COLOR: Color = Color::Green;
const BOT_COLOR: Color = Color::Blue;

/// Simulator parameters, passed by value at construction.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Index into the built-in map table.
    pub map_index: usize,
    /// Side of one grid cell's square, in pixels.
    pub cube_size: usize,
    /// Side of the partial-observation window, in cells. Must be odd.
    pub pob_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_index: 0,
            cube_size: 5,
            pob_size: 5,
        }
    }
}

/// Outcome of one simulation step. Immutable once returned; the caller
/// owns it.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The action that produced this state.
    pub action: Action,
    pub reward: f64,
    pub terminal: bool,
    /// Full screen render.
    pub screen: Frame,
    /// Partial observation centered on the bot.
    pub pob: Frame,
}

/// Owns bot/target positions, the precomputed expert plan, and the screen.
///
/// Episodes follow `new_episode` -> `step`* ; `step(None)` replays the
/// expert trajectory one action at a time.
pub struct WorldSimulator {
    config: SimConfig,
    map: GridMap,
    rng: StdRng,
    bot: Option<Cell>,
    target: Option<Cell>,
    plan: PlannedPath,
    screen: Frame,
}

impl WorldSimulator {
    pub fn new(config: SimConfig) -> Result<Self> {
        let map = GridMap::from_index(config.map_index)?;
        Self::with_map(map, config, StdRng::from_os_rng())
    }

    pub fn with_rng(config: SimConfig, rng: StdRng) -> Result<Self> {
        let map = GridMap::from_index(config.map_index)?;
        Self::with_map(map, config, rng)
    }

    /// Build a simulator on a caller-supplied map; `config.map_index` is
    /// ignored.
    pub fn with_map(map: GridMap, config: SimConfig, rng: StdRng) -> Result<Self> {
        if config.cube_size == 0 {
            return Err(SimError::ZeroCubeSize);
        }
        if config.pob_size % 2 == 0 {
            return Err(SimError::EvenObservationSize(config.pob_size));
        }
        let radius = (config.pob_size / 2) as i32;
        let margin = map.free_margin();
        if radius > margin {
            return Err(SimError::ObservationTooWide { radius, margin });
        }

        let screen = Frame::new(
            map.height() as usize * config.cube_size,
            map.width() as usize * config.cube_size,
        );
        let mut sim = Self {
            config,
            map,
            rng,
            bot: None,
            target: None,
            plan: PlannedPath::default(),
            screen,
        };
        sim.draw_obstacles();
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn bot(&self) -> Option<Cell> {
        self.bot
    }

    pub fn target(&self) -> Option<Cell> {
        self.target
    }

    /// Remaining length of the precomputed expert plan.
    pub fn plan_len(&self) -> usize {
        self.plan.len()
    }

    /// Start a new episode: place the target (given or random) and the bot
    /// (random, independently), precompute the expert plan, and take one
    /// synthetic `Stay` step for the initial observation.
    ///
    /// A `PathNotFound` from the planner is surfaced to the caller and
    /// leaves the plan empty; positions stay valid, so the caller may simply
    /// start another episode.
    pub fn new_episode(&mut self, target: Option<Cell>) -> Result<StepResult> {
        // Markers of the previous episode must go before anything is drawn.
        if let Some(old) = self.bot.take() {
            self.screen
                .fill_cell(old, self.config.cube_size, BOT_COLOR, 0);
        }
        if let Some(old) = self.target.take() {
            self.screen
                .fill_cell(old, self.config.cube_size, TARGET_COLOR, 0);
        }
        self.plan = PlannedPath::default();

        let target = match target {
            Some(cell) => {
                if self.map.is_blocked(cell) {
                    return Err(SimError::TargetBlocked(cell));
                }
                cell
            }
            None => self.random_free_cell(),
        };
        // Independent draw; coincidence with the target is not rejected.
        let bot = self.random_free_cell();
        self.target = Some(target);
        self.bot = Some(bot);

        self.plan = AStar::search(&self.map, bot, target)?;
        tracing::debug!(%bot, %target, plan_len = self.plan.len(), "new episode");

        self.screen
            .fill_cell(target, self.config.cube_size, TARGET_COLOR, 255);
        Ok(self.advance(bot, Action::Stay))
    }

    /// Advance one step. With `None`, the next expert action is popped off
    /// the precomputed plan.
    pub fn step(&mut self, action: Option<Action>) -> Result<StepResult> {
        let bot = self.bot.ok_or(SimError::EpisodeNotStarted)?;
        let action = match action {
            Some(action) => action,
            None => self.plan.pop().ok_or(SimError::PlanExhausted)?,
        };
        Ok(self.advance(bot, action))
    }

    fn advance(&mut self, bot: Cell, action: Action) -> StepResult {
        let next = action.apply(bot);
        let (reward, terminal, new_bot) = if Some(next) == self.target {
            (TARGET_REWARD, true, next)
        } else if self.map.is_blocked(next) {
            // Collision absorbs the move.
            (COLLISION_REWARD, false, bot)
        } else {
            (STEP_REWARD, false, next)
        };
        self.bot = Some(new_bot);

        let cube = self.config.cube_size;
        self.screen.fill_cell(bot, cube, BOT_COLOR, 0);
        self.screen.fill_cell(new_bot, cube, BOT_COLOR, 255);
        let pob = self
            .screen
            .crop_centered(new_bot, self.config.pob_size, cube);

        StepResult {
            action,
            reward,
            terminal,
            screen: self.screen.clone(),
            pob,
        }
    }

    fn draw_obstacles(&mut self) {
        let cube = self.config.cube_size;
        for cell in self.map.obstacle_cells() {
            self.screen.fill_cell(cell, cube, OBSTACLE_COLOR, 255);
        }
    }

    fn random_free_cell(&mut self) -> Cell {
        let free = self.map.free_cells();
        free[self.rng.random_range(0..free.len())]
    }
}
