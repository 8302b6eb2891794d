use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;
use crate::environment::Tile;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Grid has no rows")]
    Empty,
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Cloning a grid clones the backing vector, so a clone never shares
/// storage with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Builds a grid from a sequence of rows. All rows must have the
    /// width of the first row.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let height = rows.len();
        if height == 0 {
            return Err(GridError::Empty);
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(GridError::Empty);
        }
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRows {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Gets a mutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get_mut(index)
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Returns an iterator over the rows of the grid as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width)
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for immutable access.
impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (x, y) = index;
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for mutable access.
impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (x, y) = index;
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, width, height
            ),
        }
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        &self[(index.x, index.y)]
    }
}

/// Indexing using Position coordinates for mutable access
impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: Position) -> &mut Self::Output {
        &mut self[(index.x, index.y)]
    }
}

/// Represents errors raised while parsing a textual map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Unknown tile character {ch:?} at position ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
    #[error("Map contains no agent ('A') tile")]
    MissingAgent,
    #[error("Map contains no target ('*') tile")]
    MissingTarget,
    #[error("Map contains more than one agent tile, at {first:?} and {second:?}")]
    DuplicateAgent { first: Position, second: Position },
    #[error("Map contains more than one target tile, at {first:?} and {second:?}")]
    DuplicateTarget { first: Position, second: Position },
}

/// The immutable initial snapshot of an environment: the parsed tile
/// grid and the starting coordinates of the agent and the target.
///
/// Produced once by [`GridMap::parse`] and never mutated afterwards;
/// the environment deep-copies out of it on every reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    grid: Grid<Tile>,
    agent: Position,
    target: Position,
}

impl GridMap {
    /// Parses a textual map into an initial snapshot.
    ///
    /// The string is trimmed as a whole, then split into rows on line
    /// breaks; each character is one cell. All rows must have the width
    /// of the first row, every character must be one of the four
    /// recognized tiles, and the map must contain exactly one agent and
    /// exactly one target.
    pub fn parse(map_string: &str) -> Result<Self, MapError> {
        let mut rows: Vec<Vec<Tile>> = Vec::new();
        let mut agent: Option<Position> = None;
        let mut target: Option<Position> = None;

        for (y, line) in map_string.trim().lines().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, ch) in line.chars().enumerate() {
                let tile =
                    Tile::from_char(ch).ok_or(MapError::UnknownTile { ch, x, y })?;
                let pos = Position { x, y };
                match tile {
                    Tile::Agent => match agent {
                        Some(first) => {
                            return Err(MapError::DuplicateAgent { first, second: pos });
                        }
                        None => agent = Some(pos),
                    },
                    Tile::Target => match target {
                        Some(first) => {
                            return Err(MapError::DuplicateTarget { first, second: pos });
                        }
                        None => target = Some(pos),
                    },
                    Tile::Empty | Tile::Wall => {}
                }
                row.push(tile);
            }
            rows.push(row);
        }

        let grid = Grid::from_rows(rows)?;
        let agent = agent.ok_or(MapError::MissingAgent)?;
        let target = target.ok_or(MapError::MissingTarget)?;

        Ok(GridMap {
            grid,
            agent,
            target,
        })
    }

    /// The parsed tile grid.
    pub fn grid(&self) -> &Grid<Tile> {
        &self.grid
    }

    /// The agent's starting position.
    pub fn agent(&self) -> Position {
        self.agent
    }

    /// The target's position.
    pub fn target(&self) -> Position {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_from_rows_rejects_ragged_input() {
        let rows = vec![vec![1, 2, 3], vec![4, 5]];
        assert_eq!(
            Grid::from_rows(rows),
            Err(GridError::RaggedRows {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn grid_indexing_round_trips() {
        let grid = Grid::from_rows(vec![vec![0, 1], vec![2, 3]]).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid[(1, 0)], 1);
        assert_eq!(grid[Position::new(0, 1)], 2);
        assert_eq!(grid.get(2, 0), None);
        assert!(!grid.is_valid(0, 2));
    }

    #[test]
    fn grid_clone_is_independent() {
        let mut grid = Grid::from_rows(vec![vec![0, 1], vec![2, 3]]).unwrap();
        let snapshot = grid.clone();
        grid[(0, 0)] = 9;
        assert_eq!(snapshot[(0, 0)], 0);
    }

    #[test]
    fn parse_locates_agent_and_target() {
        let map = GridMap::parse("WWW\nWA*\nWWW").unwrap();
        assert_eq!(map.agent(), Position::new(1, 1));
        assert_eq!(map.target(), Position::new(2, 1));
        assert_eq!(map.grid()[(0, 0)], Tile::Wall);
        assert_eq!(map.grid()[map.agent()], Tile::Agent);
        assert_eq!(map.grid()[map.target()], Tile::Target);
    }

    #[test]
    fn parse_trims_surrounding_blank_lines() {
        let map = GridMap::parse("\nA*\n").unwrap();
        assert_eq!(map.grid().height(), 1);
        assert_eq!(map.grid().width(), 2);
    }

    #[test]
    fn parse_preserves_interior_spaces() {
        let map = GridMap::parse("WWWW\nWA W\nW *W\nWWWW").unwrap();
        assert_eq!(map.grid()[(2, 1)], Tile::Empty);
        assert_eq!(map.grid()[(1, 2)], Tile::Empty);
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(GridMap::parse("\n\n"), Err(MapError::Grid(GridError::Empty)));
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert_eq!(
            GridMap::parse("WWW\nWA*W\nWWW"),
            Err(MapError::Grid(GridError::RaggedRows {
                row: 1,
                expected: 3,
                found: 4
            }))
        );
    }

    #[test]
    fn parse_rejects_unknown_characters() {
        assert_eq!(
            GridMap::parse("A*\nWX"),
            Err(MapError::UnknownTile {
                ch: 'X',
                x: 1,
                y: 1
            })
        );
    }

    #[test]
    fn parse_rejects_missing_markers() {
        assert_eq!(GridMap::parse("W*\nWW"), Err(MapError::MissingAgent));
        assert_eq!(GridMap::parse("WA\nWW"), Err(MapError::MissingTarget));
    }

    #[test]
    fn parse_rejects_duplicate_markers() {
        assert_eq!(
            GridMap::parse("AA\n W\n *"),
            Err(MapError::DuplicateAgent {
                first: Position::new(0, 0),
                second: Position::new(1, 0),
            })
        );
        assert_eq!(
            GridMap::parse("A*\n *"),
            Err(MapError::DuplicateTarget {
                first: Position::new(1, 0),
                second: Position::new(1, 1),
            })
        );
    }
}
