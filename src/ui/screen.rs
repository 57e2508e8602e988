use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use mindtick::exercise::{
    math, memory, nback, path, stroop, Exercise, ExerciseKind, MathBlitz, MemoryMatch, NBack,
    PathFinder, Stroop,
};
use mindtick::report::format_mmss;
use mindtick::session::ActiveExercise;

use crate::ui::charting::area_to_cell;
use crate::App;

const GRID_SIDE: usize = 4;

/// Renders one exercise and names its keys.
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
    fn legend(&self) -> &'static str;
}

pub struct MemoryScreen;
pub struct StroopScreen;
pub struct NBackScreen;
pub struct MathScreen;
pub struct PathScreen;

pub fn current_screen(kind: ExerciseKind) -> Box<dyn Screen> {
    match kind {
        ExerciseKind::Memory => Box::new(MemoryScreen),
        ExerciseKind::Stroop => Box::new(StroopScreen),
        ExerciseKind::NBack => Box::new(NBackScreen),
        ExerciseKind::Math => Box::new(MathScreen),
        ExerciseKind::Path => Box::new(PathScreen),
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn spaced(spans: Vec<Span<'static>>, gap: &'static str) -> Vec<Span<'static>> {
    Itertools::intersperse(spans.into_iter(), Span::raw(gap)).collect()
}

fn status_and_body(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn status(text: String, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text, bold()))
        .alignment(Alignment::Center)
        .render(area, buf);
}

impl Screen for MemoryScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let ActiveExercise::Memory(game) = app.trainer.active() else {
            return;
        };
        let (top, body) = status_and_body(area);
        status(memory_status(game), top, buf);

        let rows = game
            .deck()
            .iter()
            .enumerate()
            .chunks(GRID_SIDE)
            .into_iter()
            .map(|row| {
                let cells = row.flat_map(|(idx, symbol)| {
                    let face = if game.is_face_up(idx) { *symbol } else { '?' };
                    let mut style = if game.is_matched(idx) {
                        Style::default().fg(Color::Green)
                    } else if game.is_face_up(idx) {
                        bold().fg(Color::Cyan)
                    } else {
                        dim()
                    };
                    if idx == app.memory_cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    [Span::styled(format!(" {face} "), style), Span::raw("  ")]
                });
                Line::from(cells.collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();

        let lines = rows
            .into_iter()
            .flat_map(|row| [row, Line::default()])
            .collect::<Vec<_>>();
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }

    fn legend(&self) -> &'static str {
        "(arrows) move / (enter) flip"
    }
}

fn memory_status(game: &MemoryMatch) -> String {
    match game.phase() {
        memory::Phase::Complete { score } => format!(
            "Complete in {} moves, {}   Score: {score}",
            game.moves(),
            format_mmss(game.final_elapsed() as i64)
        ),
        _ => format!(
            "Moves: {}   Pairs: {}/{}   Time: {}",
            game.moves(),
            game.matched_pairs(),
            game.pair_count(),
            format_mmss(game.elapsed_seconds() as i64)
        ),
    }
}

fn ink_color(ink: stroop::Ink) -> Color {
    match ink {
        stroop::Ink::Red => Color::Red,
        stroop::Ink::Blue => Color::Blue,
        stroop::Ink::Green => Color::Green,
        stroop::Ink::Yellow => Color::Yellow,
    }
}

impl Screen for StroopScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let ActiveExercise::Stroop(game) = app.trainer.active() else {
            return;
        };
        let (top, body) = status_and_body(area);
        status(stroop_status(game), top, buf);

        let levels = stroop::LEVELS
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let text = format!("{} ({}s)", level.label, level.seconds);
                if i == game.level_index() {
                    Span::styled(text, bold().add_modifier(Modifier::UNDERLINED))
                } else {
                    Span::styled(text, dim())
                }
            })
            .collect::<Vec<_>>();

        let stimulus = match game.phase() {
            stroop::Phase::Presenting { stimulus, .. } => Span::styled(
                stimulus.word.to_string(),
                bold().fg(ink_color(stimulus.ink)),
            ),
            stroop::Phase::Idle => Span::styled("press space to start", dim()),
            stroop::Phase::Paused => Span::styled("paused", dim()),
            stroop::Phase::Blank => Span::raw(""),
            stroop::Phase::Complete => Span::styled(
                format!(
                    "Accuracy: {}%   Avg RT: {} ms",
                    game.accuracy_percent(),
                    game.avg_rt_ms()
                ),
                bold(),
            ),
        };

        let answers = stroop::INKS
            .iter()
            .map(|ink| {
                let name = ink.to_string();
                let key = name.chars().next().unwrap_or(' ').to_ascii_lowercase();
                Span::styled(format!("({key}) {name}"), Style::default().fg(ink_color(*ink)))
            })
            .collect::<Vec<_>>();

        let lines = vec![
            Line::from(spaced(levels, "   ")),
            Line::default(),
            Line::default(),
            Line::from(stimulus),
            Line::default(),
            Line::default(),
            Line::from(spaced(answers, "  ")),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }

    fn legend(&self) -> &'static str {
        "(space) start/stop / (r)(b)(g)(y) ink / (left)(right) level / (n)ext level"
    }
}

fn stroop_status(game: &Stroop) -> String {
    format!(
        "Trial {}/{}   Correct: {}   Time Left: {}s",
        game.trial().min(stroop::TOTAL_TRIALS),
        stroop::TOTAL_TRIALS,
        game.correct(),
        game.time_left()
    )
}

impl Screen for NBackScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let ActiveExercise::NBack(game) = app.trainer.active() else {
            return;
        };
        let (top, body) = status_and_body(area);
        status(nback_status(game), top, buf);

        let symbol = match game.phase() {
            nback::Phase::Idle => Span::styled("press space to start", dim()),
            nback::Phase::Paused => Span::styled("paused", dim()),
            nback::Phase::Running => Span::styled(
                format!("  {}  ", game.current()),
                bold().fg(Color::Cyan).add_modifier(Modifier::REVERSED),
            ),
            nback::Phase::Complete => Span::styled(
                format!(
                    "Hits: {}   False alarms: {}   Missed: {}",
                    game.hits(),
                    game.false_alarms(),
                    game.missed()
                ),
                bold(),
            ),
        };

        let lines = vec![
            Line::default(),
            Line::default(),
            Line::from(symbol),
            Line::default(),
            Line::from(Span::styled(
                format!("press enter when the letter matches the one {} back", nback::LAG),
                dim(),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);
    }

    fn legend(&self) -> &'static str {
        "(space) start/pause / (enter) match"
    }
}

fn nback_status(game: &NBack) -> String {
    format!(
        "Hits: {}   False alarms: {}   Time Left: {}s",
        game.hits(),
        game.false_alarms(),
        game.time_left()
    )
}

impl Screen for MathScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let ActiveExercise::Math(game) = app.trainer.active() else {
            return;
        };
        let (top, body) = status_and_body(area);
        status(math_status(game), top, buf);

        let levels = math::LEVELS
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let text = format!("{} ({}s)", level.label, level.seconds);
                if i == game.level_index() {
                    Span::styled(text, bold().add_modifier(Modifier::UNDERLINED))
                } else {
                    Span::styled(text, dim())
                }
            })
            .collect::<Vec<_>>();

        let question = match game.phase() {
            math::Phase::Over => Line::from(Span::styled(
                format!("Time! {} of {} correct", game.score(), game.answered()),
                bold(),
            )),
            _ => Line::from(vec![
                Span::styled(format!("{} = ", game.question().text()), bold()),
                Span::styled(
                    format!("{}_", game.answer_text()),
                    bold().fg(Color::Cyan),
                ),
            ]),
        };

        let lines = vec![
            Line::from(spaced(levels, "   ")),
            Line::default(),
            Line::default(),
            question,
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }

    fn legend(&self) -> &'static str {
        "(0-9 -) type / (enter) submit / (left)(right) level"
    }
}

fn math_status(game: &MathBlitz) -> String {
    format!("Score: {}   Time Left: {}s", game.score(), game.time_left())
}

impl Screen for PathScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let ActiveExercise::Path(game) = app.trainer.active() else {
            return;
        };
        let (top, body) = status_and_body(area);
        status(path_status(game), top, buf);

        let block = Block::default().borders(Borders::ALL).title(format!(
            " reveal {:.1}s ",
            game.reveal_ms() as f64 / 1000.0
        ));
        let canvas = block.inner(body);
        block.render(body, buf);
        app.path_canvas.set(canvas);

        match game.phase() {
            path::Phase::Idle => {
                Paragraph::new(Span::styled("press space to start (60s)", dim()))
                    .alignment(Alignment::Center)
                    .render(canvas, buf);
                return;
            }
            path::Phase::SessionOver => {
                Paragraph::new(Span::styled(
                    format!("Session Over   Tasks: {}", game.tasks_done()),
                    bold(),
                ))
                .alignment(Alignment::Center)
                .render(canvas, buf);
                return;
            }
            _ => {}
        }

        if canvas.width == 0 || canvas.height == 0 {
            return;
        }
        let showing = matches!(game.phase(), path::Phase::Showing { .. });
        let last_shown = game.visible_points().len().saturating_sub(1);
        for (idx, point) in game.visible_points().iter().enumerate() {
            let (col, row) = area_to_cell(canvas, point.x, point.y);
            let style = if showing && idx == last_shown {
                bold().fg(Color::Yellow).add_modifier(Modifier::REVERSED)
            } else if let path::Phase::Input { next } = game.phase() {
                if idx < next {
                    Style::default().fg(Color::Green)
                } else {
                    bold().fg(Color::Cyan)
                }
            } else {
                bold()
            };
            let text = if showing {
                "●".to_string()
            } else {
                point.label.to_string()
            };
            buf.set_string(col, row, text, style);
        }
    }

    fn legend(&self) -> &'static str {
        "(space) start/stop / (1-6) or click pick / ([)(]) reveal speed"
    }
}

fn path_status(game: &PathFinder) -> String {
    let state = match game.phase() {
        path::Phase::Idle => "Ready",
        path::Phase::Showing { .. } => "Watch order",
        path::Phase::Input { .. } => "Your turn",
        path::Phase::Transition => "Well done",
        path::Phase::SessionOver => "Session Over",
    };
    format!(
        "{state}   Tasks: {}   Targets: {}   Time Left: {}s",
        game.tasks_done(),
        game.targets(),
        game.time_left()
    )
}
