use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::map::{Grid, GridMap, MapError};
use crate::Position;

/// Represents the occupant of a single grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Agent,
    #[default]
    Empty,
    Wall,
    Target,
}

impl Tile {
    /// The fixed one-character encoding used by textual maps.
    pub const fn as_char(self) -> char {
        match self {
            Tile::Agent => 'A',
            Tile::Empty => ' ',
            Tile::Wall => 'W',
            Tile::Target => '*',
        }
    }

    /// Decodes a map character, returning `None` for anything outside
    /// the four recognized tiles.
    pub const fn from_char(ch: char) -> Option<Tile> {
        match ch {
            'A' => Some(Tile::Agent),
            ' ' => Some(Tile::Empty),
            'W' => Some(Tile::Wall),
            '*' => Some(Tile::Target),
            _ => None,
        }
    }
}

/// Represents the moves available to the agent, one per step.
///
/// Each action carries a fixed unit displacement; the table never
/// changes over the lifetime of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions, in index order. Discrete-action callers address
    /// actions by position in this table.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Unit displacement `(dx, dy)` applied to the agent position.
    /// `y` grows through the rows in parse order.
    pub const fn displacement(self) -> (isize, isize) {
        match self {
            Action::Up => (0, 1),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = EnvError;

    fn try_from(index: usize) -> Result<Self, EnvError> {
        Action::ALL
            .get(index)
            .copied()
            .ok_or(EnvError::InvalidAction { index })
    }
}

/// Selects how [`Environment::render`] presents the current state.
///
/// Only [`RenderMode::Human`] is implemented; the other modes exist so
/// that asking for them fails explicitly instead of silently doing
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Print a textual dump of the grid to stdout.
    Human,
    /// Return a pixel buffer. Not implemented.
    RgbArray,
    /// Return an ANSI string. Not implemented.
    Ansi,
}

/// Represents errors raised by environment operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("Invalid action index {index}, expected 0..4")]
    InvalidAction { index: usize },
    #[error("Render mode {mode:?} is not implemented")]
    UnsupportedRender { mode: RenderMode },
}

/// Open-ended diagnostic side channel attached to every step result.
/// The core defines no fields; it exists for wrappers to populate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub extra: Vec<(&'static str, f32)>,
}

impl Info {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }
}

/// The result of advancing an environment by one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<Obs> {
    /// The agent's observation after the step.
    pub observation: Obs,
    /// Reward granted for the step.
    pub reward: f32,
    /// Whether the episode has ended.
    pub done: bool,
    /// Auxiliary diagnostics, empty in this core.
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f32, done: bool) -> Self {
        Step {
            observation,
            reward,
            done,
            info: Info::new(),
        }
    }
}

/// The step/reset/render contract an episodic environment satisfies,
/// independent of any hosting framework.
pub trait Env {
    type Obs;
    type Act;

    /// Resets the environment to its initial state and returns the
    /// initial observation.
    fn reset(&mut self) -> Self::Obs;

    /// Applies one action and advances the environment by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>, EnvError>;

    /// Renders the current state in the requested mode.
    fn render(&self, mode: RenderMode) -> Result<(), EnvError>;
}

/// The built-in four-room map.
pub const DEFAULT_MAP: &str = "
WWWWWWWWWWWWW
W     W     W
W  A  W     W
W           W
W     W     W
W     W     W
WW WWWW     W
W     WWW WWW
W     W     W
W     W     W
W         * W
W     W     W
WWWWWWWWWWWWW
";

/// The grid-world simulation environment.
///
/// Owns the live state (grid, agent location, target location) and the
/// immutable initial snapshot it was parsed from. One control loop is
/// expected to own an instance end to end; there is no interior
/// locking and no randomness anywhere in the transition function.
#[derive(Debug, Clone)]
pub struct Environment {
    initial: GridMap,
    grid: Grid<Tile>,
    agent: Position,
    target: Position,
    done: bool,
}

impl Environment {
    /// Creates an environment from an already parsed snapshot.
    pub fn new(initial: GridMap) -> Self {
        let grid = initial.grid().clone();
        let agent = initial.agent();
        let target = initial.target();
        Environment {
            initial,
            grid,
            agent,
            target,
            done: false,
        }
    }

    /// Parses a textual map and creates an environment from it.
    pub fn from_map(map_string: &str) -> Result<Self, MapError> {
        Ok(Environment::new(GridMap::parse(map_string)?))
    }

    /// Restores the live state from the initial snapshot and returns
    /// the initial observation.
    ///
    /// The grid is deep-copied out of the snapshot, so later `step`
    /// mutations never reach back into it.
    pub fn reset(&mut self) -> Position {
        self.grid = self.initial.grid().clone();
        self.agent = self.initial.agent();
        self.target = self.initial.target();
        self.done = false;
        tracing::debug!(agent = ?self.agent, target = ?self.target, "environment reset");
        self.agent
    }

    /// Runs one timestep of the environment's dynamics.
    ///
    /// A move into a wall or past the boundary is rejected: the state
    /// is unchanged and the reward is zero. An accepted move earns
    /// reward 1 and ends the episode when the agent reaches the
    /// target. Stepping a finished episode is a stable no-op that
    /// keeps returning the terminal observation.
    pub fn step(&mut self, action: Action) -> Step<Position> {
        if self.done {
            return Step::new(self.agent, 0.0, true);
        }

        let (dx, dy) = action.displacement();
        let candidate = self
            .agent
            .offset(dx, dy)
            .filter(|p| self.grid.is_valid(p.x, p.y));
        let next = match candidate {
            Some(p) if self.grid[p] != Tile::Wall => p,
            _ => {
                tracing::trace!(?action, agent = ?self.agent, "move rejected");
                return Step::new(self.agent, 0.0, false);
            }
        };

        self.grid[self.agent] = Tile::Empty;
        self.agent = next;
        self.grid[next] = Tile::Agent;
        self.done = self.agent == self.target;
        if self.done {
            tracing::debug!(agent = ?self.agent, "target reached, episode over");
        }
        Step::new(self.agent, 1.0, self.done)
    }

    /// Converts an action index and steps. The index path is where an
    /// unrecognized action surfaces as [`EnvError::InvalidAction`].
    pub fn step_index(&mut self, index: usize) -> Result<Step<Position>, EnvError> {
        let action = Action::try_from(index)?;
        Ok(self.step(action))
    }

    /// Renders the current state. [`RenderMode::Human`] prints the
    /// grid to stdout; every other mode is an error.
    pub fn render(&self, mode: RenderMode) -> Result<(), EnvError> {
        match mode {
            RenderMode::Human => {
                println!("{self}");
                Ok(())
            }
            mode => Err(EnvError::UnsupportedRender { mode }),
        }
    }

    /// The live tile grid.
    pub fn grid(&self) -> &Grid<Tile> {
        &self.grid
    }

    /// The agent's current location.
    pub fn agent_location(&self) -> Position {
        self.agent
    }

    /// The target's location.
    pub fn target_location(&self) -> Position {
        self.target
    }

    /// Whether the episode has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The immutable snapshot this environment resets to.
    pub fn initial(&self) -> &GridMap {
        &self.initial
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::from_map(DEFAULT_MAP).expect("built-in map is well-formed")
    }
}

impl Env for Environment {
    type Obs = Position;
    type Act = Action;

    fn reset(&mut self) -> Position {
        Environment::reset(self)
    }

    fn step(&mut self, action: Action) -> Result<Step<Position>, EnvError> {
        Ok(Environment::step(self, action))
    }

    fn render(&self, mode: RenderMode) -> Result<(), EnvError> {
        Environment::render(self, mode)
    }
}

/// The textual dump used by human rendering: one line per row, one
/// character per tile.
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.grid.rows().enumerate() {
            if y > 0 {
                f.write_char('\n')?;
            }
            for tile in row {
                f.write_char(tile.as_char())?;
            }
        }
        Ok(())
    }
}
