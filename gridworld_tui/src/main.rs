use anyhow::Result;
use clap::Parser;
use gridworld_core::{Action, Environment, Position, Tile};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::Duration,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load instead of the built-in four-room map
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,
}

struct App {
    /// The core simulation environment.
    environment: Environment,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Steps taken in the current episode.
    steps: u32,
    /// Reward accumulated in the current episode.
    total_reward: f32,
}

impl App {
    fn new(map_file: Option<PathBuf>) -> Result<Self> {
        let environment = match map_file {
            Some(path) => {
                let map_string = std::fs::read_to_string(&path)?;
                Environment::from_map(&map_string)?
            }
            None => Environment::default(),
        };
        Ok(App {
            environment,
            should_quit: false,
            steps: 0,
            total_reward: 0.0,
        })
    }

    /// Applies one move to the environment.
    fn step(&mut self, action: Action) {
        if self.environment.is_done() {
            return;
        }
        let step = self.environment.step(action);
        self.steps += 1;
        self.total_reward += step.reward;
    }

    /// Starts a fresh episode.
    fn reset(&mut self) {
        self.environment.reset();
        self.steps = 0;
        self.total_reward = 0.0;
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(map) = &args.map {
        if !map.exists() {
            return Err(anyhow::anyhow!("Map file does not exist: {}", map.display()));
        }
    }

    // Create the application state before touching the terminal so a
    // bad map fails with a readable error.
    let mut app = App::new(args.map)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if crossterm::event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('r') => app.reset(),
                    // Screen rows grow downward, so the key pointing up
                    // issues the action whose displacement decreases y.
                    KeyCode::Up => app.step(Action::Down),
                    KeyCode::Down => app.step(Action::Up),
                    KeyCode::Left => app.step(Action::Left),
                    KeyCode::Right => app.step(Action::Right),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Area for the map
            Constraint::Length(3), // Area for episode status
            Constraint::Length(2), // Area for help text
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.environment);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("Arrow keys to move, 'r' to reset, 'q' or 'Esc' to quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the episode status line onto the frame.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let Position { x, y } = app.environment.agent_location();
    let mut spans = vec![Span::raw(format!(
        "Agent: ({}, {})  Steps: {}  Reward: {}",
        x, y, app.steps, app.total_reward
    ))];
    if app.environment.is_done() {
        spans.push(Span::styled(
            "  Target reached!",
            Style::default().fg(Color::Green).bold(),
        ));
    }
    let status_widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Episode"));
    frame.render_widget(status_widget, area);
}

/// Renders the environment grid onto the frame.
fn render_map(frame: &mut Frame, area: Rect, environment: &Environment) {
    let grid = environment.grid();

    let lines: Vec<Line> = grid
        .rows()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|tile| {
                    let style = match tile {
                        Tile::Agent => Style::default().fg(Color::Red).bold(),
                        Tile::Target => Style::default().fg(Color::Green),
                        Tile::Wall => Style::default().fg(Color::DarkGray),
                        Tile::Empty => Style::default(),
                    };
                    Span::styled(tile.as_char().to_string(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Grid World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
