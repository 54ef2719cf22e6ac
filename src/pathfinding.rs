use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, SimError};
use crate::map::GridMap;
use crate::types::{Action, Cell};

/// Expert action sequence from bot to target.
///
/// Built back-to-front by walking parent pointers from the goal, so it is a
/// stack: `pop` takes from the end and returns the next action to execute.
#[derive(Debug, Clone, Default)]
pub struct PlannedPath {
    actions: Vec<Action>,
}

impl PlannedPath {
    fn from_reverse_walk(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Next action to execute.
    pub fn pop(&mut self) -> Option<Action> {
        self.actions.pop()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
struct Node {
    f: i32,
    seq: u32,
    cell: Cell,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, insertion order as the deterministic tie-break.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct AStar;

impl AStar {
    /// Shortest collision-free action sequence from `start` to `goal`.
    ///
    /// Manhattan heuristic over 4-directional unit-cost moves, so returned
    /// paths are optimal. `Stay` is never expanded; a move into an obstacle
    /// is dropped from successor generation rather than treated as a
    /// zero-cost self-move.
    #[tracing::instrument(level = "trace", skip(map), fields(start = %start, goal = %goal))]
    pub fn search(map: &GridMap, start: Cell, goal: Cell) -> Result<PlannedPath> {
        if start == goal {
            return Ok(PlannedPath::default());
        }

        let cells = map.cell_count();
        let mut open = BinaryHeap::new();
        let mut g_score = vec![i32::MAX; cells];
        let mut best_f = vec![i32::MAX; cells];
        let mut closed = vec![false; cells];
        let mut came_from: Vec<Option<(Cell, Action)>> = vec![None; cells];
        let mut seq = 0u32;

        let start_ind = map.cell_index(start);
        g_score[start_ind] = 0;
        best_f[start_ind] = start.manhattan(&goal);
        open.push(Node {
            f: best_f[start_ind],
            seq,
            cell: start,
        });

        let mut expansions = 0usize;
        while let Some(Node { cell: current, .. }) = open.pop() {
            let current_ind = map.cell_index(current);
            if closed[current_ind] {
                continue;
            }
            closed[current_ind] = true;
            expansions += 1;

            for action in Action::MOVES {
                let neighbor = action.apply(current);
                if neighbor == goal {
                    // The goal never waits in the open set.
                    came_from[map.cell_index(goal)] = Some((current, action));
                    let path = reconstruct(map, &came_from, goal);
                    tracing::trace!(expansions, steps = path.len(), "path found");
                    return Ok(path);
                }
                if map.is_blocked(neighbor) {
                    continue;
                }
                let neighbor_ind = map.cell_index(neighbor);
                if closed[neighbor_ind] {
                    continue;
                }
                let tentative_g = g_score[current_ind] + 1;
                let f = tentative_g + neighbor.manhattan(&goal);
                // Non-strict on purpose: an equal-cost rediscovery re-pushes
                // the cell with a fresh parent.
                if f <= best_f[neighbor_ind] {
                    g_score[neighbor_ind] = tentative_g;
                    best_f[neighbor_ind] = f;
                    came_from[neighbor_ind] = Some((current, action));
                    seq += 1;
                    open.push(Node {
                        f,
                        seq,
                        cell: neighbor,
                    });
                }
            }
        }

        tracing::trace!(expansions, "no path");
        Err(SimError::PathNotFound { start, goal })
    }
}

fn reconstruct(map: &GridMap, came_from: &[Option<(Cell, Action)>], goal: Cell) -> PlannedPath {
    let mut actions = Vec::new();
    let mut current = goal;
    while let Some((prev, action)) = came_from[map.cell_index(current)] {
        actions.push(action);
        current = prev;
    }
    PlannedPath::from_reverse_walk(actions)
}
