mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    cell::Cell,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::Instant,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mindtick::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    exercise::{stroop::Ink, Exercise, ExerciseKind},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, Stamped},
    session::{ActiveExercise, Trainer, TrainerSettings},
    sound::{Bell, Toggle},
    store::{KvStore, MemoryStore, SqliteStore},
};

use crate::ui::charting::cell_to_area;

const MEMORY_COLUMNS: usize = 4;

/// five timed brain-training exercises with a daily practice goal
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// exercise to open first (defaults to the last one used)
    #[clap(short = 'e', long, value_enum)]
    exercise: Option<ExerciseKind>,

    /// start with sound off
    #[clap(long)]
    mute: bool,

    /// keep progress in memory only
    #[clap(long)]
    in_memory: bool,

    /// seed every exercise RNG for reproducible sessions
    #[clap(long)]
    seed: Option<u64>,

    /// append logs to this file instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub trainer: Trainer,
    pub sound: Rc<Toggle<Bell>>,
    /// Highlighted card on the memory board.
    pub memory_cursor: usize,
    /// Where the path canvas was last drawn, for mapping mouse clicks.
    pub path_canvas: Cell<Rect>,
}

impl App {
    pub fn new(trainer: Trainer, sound: Rc<Toggle<Bell>>) -> Self {
        Self {
            trainer,
            sound,
            memory_cursor: 0,
            path_canvas: Cell::new(Rect::default()),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit
            }
            KeyCode::Tab => {
                self.trainer.next_exercise(now);
                self.memory_cursor = 0;
            }
            KeyCode::BackTab => {
                self.trainer.prev_exercise(now);
                self.memory_cursor = 0;
            }
            KeyCode::F(2) => {
                let enabled = self.sound.toggle();
                tracing::info!(enabled, "sound toggled");
            }
            KeyCode::F(5) => {
                self.trainer.active_mut().as_exercise_mut().restart(now);
            }
            _ => self.on_exercise_key(key.code, now),
        }
        Flow::Continue
    }

    fn on_exercise_key(&mut self, code: KeyCode, now: Instant) {
        let cursor = &mut self.memory_cursor;
        match self.trainer.active_mut() {
            ActiveExercise::Memory(game) => {
                let cards = game.deck().len();
                match code {
                    KeyCode::Left => *cursor = cursor.saturating_sub(1),
                    KeyCode::Right => *cursor = (*cursor + 1).min(cards - 1),
                    KeyCode::Up => *cursor = cursor.saturating_sub(MEMORY_COLUMNS),
                    KeyCode::Down if *cursor + MEMORY_COLUMNS < cards => *cursor += MEMORY_COLUMNS,
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        game.flip(*cursor, now);
                    }
                    _ => {}
                }
            }
            ActiveExercise::Stroop(game) => match code {
                KeyCode::Char(' ') if game.is_running() => game.stop(now),
                KeyCode::Char(' ') => game.start(now),
                KeyCode::Char('n') => game.next_level(now),
                KeyCode::Char(c) => {
                    if let Some(ink) = ink_for_key(c) {
                        game.answer(ink, now);
                    }
                }
                KeyCode::Left => game.select_level(game.level_index().saturating_sub(1), now),
                KeyCode::Right => game.select_level(game.level_index() + 1, now),
                _ => {}
            },
            ActiveExercise::NBack(game) => match code {
                KeyCode::Char(' ') => game.toggle(now),
                KeyCode::Enter => {
                    game.press(now);
                }
                _ => {}
            },
            ActiveExercise::Math(game) => match code {
                KeyCode::Char(c) => game.type_char(c),
                KeyCode::Backspace => game.backspace(),
                KeyCode::Enter => {
                    game.submit(now);
                }
                KeyCode::Left => game.select_level(game.level_index().saturating_sub(1), now),
                KeyCode::Right => game.select_level(game.level_index() + 1, now),
                _ => {}
            },
            ActiveExercise::Path(game) => match code {
                KeyCode::Char(' ') if game.is_running() => game.stop(now),
                KeyCode::Char(' ') => game.start_session(now),
                KeyCode::Char('[') => game.faster(now),
                KeyCode::Char(']') => game.slower(now),
                KeyCode::Char(c) => {
                    if let Some(label) = c.to_digit(10) {
                        game.select_label(label as u8, now);
                    }
                }
                _ => {}
            },
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let canvas = self.path_canvas.get();
        if let ActiveExercise::Path(game) = self.trainer.active_mut() {
            if let Some((x, y)) = cell_to_area(canvas, mouse.column, mouse.row) {
                game.select_at(x, y, now);
            }
        }
    }
}

fn ink_for_key(c: char) -> Option<Ink> {
    match c {
        'r' => Some(Ink::Red),
        'b' => Some(Ink::Blue),
        'g' => Some(Ink::Green),
        'y' => Some(Ink::Yellow),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing(cli.log_file.clone());

    let config_store = FileConfigStore::new();
    let config = config_store.load();

    let store: Rc<dyn KvStore> = if cli.in_memory {
        Rc::new(MemoryStore::new())
    } else {
        match SqliteStore::open_default() {
            Ok(store) => Rc::new(store),
            Err(err) => {
                tracing::warn!(%err, "progress database unavailable, keeping progress in memory");
                Rc::new(MemoryStore::new())
            }
        }
    };
    let sound = Rc::new(Toggle::new(Bell, config.sound && !cli.mute));
    let settings = TrainerSettings {
        exercise: cli.exercise.unwrap_or(config.exercise),
        stroop_level: config.stroop_level,
        math_level: config.math_level,
        seed: cli.seed,
    };
    let trainer = Trainer::new(store, sound.clone(), settings);
    let mut app = App::new(trainer, sound);
    tracing::info!(exercise = %settings.exercise, "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.trainer.shutdown(Instant::now());
    let settings = app.trainer.settings();
    let sound_on = if cli.mute && !app.sound.is_enabled() {
        config.sound
    } else {
        app.sound.is_enabled()
    };
    let saved = Config {
        sound: sound_on,
        exercise: settings.exercise,
        stroop_level: settings.stroop_level,
        math_level: settings.math_level,
    };
    if let Err(err) = config_store.save(&saved) {
        tracing::warn!(%err, "failed to save config");
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        app.trainer.tick(Instant::now());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let Stamped { event, at } = runner.step();
        match event {
            AppEvent::Key(key) => {
                if app.on_key(key, at) == Flow::Quit {
                    break;
                }
            }
            AppEvent::Mouse(mouse) => app.on_mouse(mouse, at),
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }

    Ok(())
}

fn init_tracing(log_file: Option<PathBuf>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let path = log_file.or_else(AppDirs::log_path);
    if let Some((path, file)) = path.and_then(open_log_file) {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "logging initialized");
        return;
    }

    // nowhere to write; the terminal is busy with the UI
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file(path: PathBuf) -> Option<(PathBuf, fs::File)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((path, file))
}
