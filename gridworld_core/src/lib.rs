use serde::{Deserialize, Serialize};

pub mod environment;
pub mod map;

pub use environment::{
    Action, DEFAULT_MAP, Env, EnvError, Environment, Info, RenderMode, Step, Tile,
};
pub use map::{Grid, GridError, GridMap, MapError};

/// Represents a 2D coordinate. `x` is the column, `y` the row of the
/// parsed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Offsets this position by `(dx, dy)`, returning `None` when the
    /// result would fall below zero on either axis.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}
