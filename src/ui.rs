pub mod charting;
pub mod progress_panel;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use mindtick::exercise::ExerciseKind;

use crate::ui::progress_panel::render_progress;
use crate::ui::screen::current_screen;
use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const PANEL_WIDTH: u16 = 34;
/// Below this width the progress panel is dropped.
const MIN_SPLIT_WIDTH: u16 = 72;
const GLOBAL_KEYS: &str = "(tab) next / (shift-tab) prev / (f5) restart / (f2) sound / (esc) quit";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let kind = self.trainer.active().kind();
        let screen = current_screen(kind);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // tabs
                Constraint::Length(1), // padding
                Constraint::Min(6),    // exercise + panel
                Constraint::Length(1), // exercise keys
                Constraint::Length(1), // global keys
            ])
            .split(area);

        let titles = ExerciseKind::ALL
            .iter()
            .map(|k| Line::from(k.to_string()))
            .collect::<Vec<_>>();
        let selected = ExerciseKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(0);
        let sound_label = if self.sound.is_enabled() {
            "sound on"
        } else {
            "sound off"
        };
        let tab_area = Rect {
            width: chunks[0]
                .width
                .saturating_sub(sound_label.width() as u16 + 1),
            ..chunks[0]
        };
        Tabs::new(titles)
            .select(selected)
            .highlight_style(bold_style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED))
            .divider("|")
            .render(tab_area, buf);
        Paragraph::new(Span::styled(
            sound_label,
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Right)
        .render(chunks[0], buf);

        let body = chunks[2];
        if body.width >= MIN_SPLIT_WIDTH {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(PANEL_WIDTH)])
                .split(body);
            screen.render(self, split[0], buf);
            render_progress(&self.trainer.summary(), split[1], buf);
        } else {
            screen.render(self, body, buf);
        }

        Paragraph::new(Span::styled(screen.legend(), italic_style))
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        Paragraph::new(Span::styled(GLOBAL_KEYS, italic_style))
            .wrap(Wrap { trim: true })
            .render(chunks[4], buf);
    }
}
