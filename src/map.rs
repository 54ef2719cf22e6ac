use crate::error::{Result, SimError};
use crate::types::Cell;

/// 16x16 maze with a two-cell obstacle border, sized for cube 5 / pob 5.
const MAP_MAZE: &[&str] = &[
    "################",
    "################",
    "##...........###",
    "##.###.###...###",
    "##.#.....#...###",
    "##.#.###.#...###",
    "##.#.###.#...###",
    "##.#.###.#...###",
    "##.#.....#...###",
    "##.#######...###",
    "##...........###",
    "##.#########.###",
    "##...........###",
    "##...........###",
    "################",
    "################",
];

/// 8x8 room with a one-cell obstacle border, sized for cube 10 / pob 3.
const MAP_ROOM: &[&str] = &[
    "########",
    "#......#",
    "#.####.#",
    "#.#....#",
    "#.#.##.#",
    "#.#.#..#",
    "#......#",
    "########",
];

const BUILTIN_MAPS: [&[&str]; 2] = [MAP_MAZE, MAP_ROOM];

/// Static obstacle layout. Immutable once parsed; the free-cell list keeps
/// row-major order so random placement is reproducible under a fixed seed.
#[derive(Debug, Clone)]
pub struct GridMap {
    height: i32,
    width: i32,
    blocked: Vec<bool>,
    free_cells: Vec<Cell>,
}

impl GridMap {
    pub fn map_count() -> usize {
        BUILTIN_MAPS.len()
    }

    /// Look up a map in the built-in table. Same index, same grid.
    pub fn from_index(map_index: usize) -> Result<Self> {
        let rows = BUILTIN_MAPS
            .get(map_index)
            .ok_or(SimError::UnknownMap(map_index))?;
        Self::from_rows(rows)
    }

    /// Parse an obstacle grid from ASCII rows: `#` obstacle, `.` free.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        if rows.is_empty() {
            return Err(SimError::InvalidMap("no rows".into()));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(SimError::InvalidMap("empty row".into()));
        }

        let mut blocked = Vec::with_capacity(rows.len() * width);
        let mut free_cells = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            if line.len() != width {
                return Err(SimError::InvalidMap(format!(
                    "row {row} has length {}, expected {width}",
                    line.len()
                )));
            }
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    '#' => blocked.push(true),
                    '.' => {
                        blocked.push(false);
                        free_cells.push(Cell::new(row as i32, col as i32));
                    }
                    other => {
                        return Err(SimError::InvalidMap(format!(
                            "unexpected character {other:?} at ({row}, {col})"
                        )));
                    }
                }
            }
        }
        if free_cells.is_empty() {
            return Err(SimError::InvalidMap("no free cells".into()));
        }

        Ok(Self {
            height: rows.len() as i32,
            width: width as i32,
            blocked,
            free_cells,
        })
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.height && cell.col >= 0 && cell.col < self.width
    }

    /// Whether `cell` is an obstacle. Out-of-bounds counts as blocked.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        !self.in_bounds(cell) || self.blocked[self.cell_index(cell)]
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> &[Cell] {
        &self.free_cells
    }

    pub fn obstacle_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.blocked
            .iter()
            .enumerate()
            .filter(|&(_, &blocked)| blocked)
            .map(|(i, _)| Cell::new(i as i32 / self.width, i as i32 % self.width))
    }

    /// Minimum distance of any free cell to the map edge. This is the
    /// obstacle border that keeps bot-centered crops inside the screen.
    pub fn free_margin(&self) -> i32 {
        self.free_cells
            .iter()
            .map(|c| {
                c.row
                    .min(c.col)
                    .min(self.height - 1 - c.row)
                    .min(self.width - 1 - c.col)
            })
            .min()
            .unwrap_or(0)
    }

    pub(crate) fn cell_count(&self) -> usize {
        (self.height * self.width) as usize
    }

    pub(crate) fn cell_index(&self, cell: Cell) -> usize {
        (cell.row * self.width + cell.col) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_maps_parse() {
        assert_eq!(GridMap::map_count(), 2);

        let maze = GridMap::from_index(0).unwrap();
        assert_eq!(maze.height(), 16);
        assert_eq!(maze.width(), 16);
        assert_eq!(maze.free_margin(), 2);

        let room = GridMap::from_index(1).unwrap();
        assert_eq!(room.height(), 8);
        assert_eq!(room.width(), 8);
        assert_eq!(room.free_margin(), 1);
    }

    #[test]
    fn unknown_index_is_rejected() {
        assert_eq!(
            GridMap::from_index(99).unwrap_err(),
            SimError::UnknownMap(99)
        );
    }

    #[test]
    fn free_cells_are_row_major() {
        let room = GridMap::from_index(1).unwrap();
        let free = room.free_cells();
        assert_eq!(free[0], Cell::new(1, 1));
        for pair in free.windows(2) {
            assert!((pair[0].row, pair[0].col) < (pair[1].row, pair[1].col));
        }
        let obstacles = room.obstacle_cells().count();
        assert_eq!(free.len() + obstacles, 64);
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let room = GridMap::from_index(1).unwrap();
        assert!(room.is_blocked(Cell::new(-1, 0)));
        assert!(room.is_blocked(Cell::new(0, 8)));
        assert!(room.is_blocked(Cell::new(0, 0)));
        assert!(!room.is_blocked(Cell::new(1, 1)));
    }

    #[test]
    fn malformed_maps_are_rejected() {
        assert!(matches!(
            GridMap::from_rows(&[]),
            Err(SimError::InvalidMap(_))
        ));
        assert!(matches!(
            GridMap::from_rows(&["###", "##"]),
            Err(SimError::InvalidMap(_))
        ));
        assert!(matches!(
            GridMap::from_rows(&["#x#"]),
            Err(SimError::InvalidMap(_))
        ));
        assert!(matches!(
            GridMap::from_rows(&["###", "###"]),
            Err(SimError::InvalidMap(_))
        ));
    }
}
