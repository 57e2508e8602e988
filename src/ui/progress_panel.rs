use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use mindtick::report::{format_mmss, DayBar, ProgressSummary};

use crate::ui::charting::bar;

const BAR_WIDTH: u16 = 12;

fn percent_color(percent: u8) -> Color {
    if percent >= 100 {
        Color::Green
    } else if percent >= 50 {
        Color::Yellow
    } else {
        Color::DarkGray
    }
}

/// One week row: `MM-DD  ████░░░░  mm:ss`
pub fn present_day(day: &DayBar) -> Row<'static> {
    Row::new(vec![
        Cell::from(day.label.clone()),
        Cell::from(bar(day.percent, BAR_WIDTH))
            .style(Style::default().fg(percent_color(day.percent))),
        Cell::from(format_mmss(day.seconds as i64)),
    ])
}

pub fn render_progress(summary: &ProgressSummary, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title(" Progress ");
    let inner = block.inner(area);
    block.render(area, buf);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = vec![
        Line::from(Span::styled(
            format!("Daily Goal: {} minutes", summary.goal_minutes()),
            bold,
        )),
        Line::from(vec![
            Span::styled(summary.today_clock.clone(), bold.fg(Color::Cyan)),
            Span::raw(format!("  {}%", summary.percent)),
        ]),
        Line::from(Span::styled(
            bar(summary.percent, BAR_WIDTH + 12),
            Style::default().fg(percent_color(summary.percent)),
        )),
        Line::from(format!("Streak: {} days", summary.streak)),
        Line::default(),
    ];
    let header_height = header.len() as u16;
    Paragraph::new(header).render(
        Rect {
            height: header_height.min(inner.height),
            ..inner
        },
        buf,
    );

    if inner.height <= header_height {
        return;
    }
    let rows = summary.week.iter().map(present_day).collect::<Vec<_>>();
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(BAR_WIDTH),
            Constraint::Length(5),
        ],
    )
    .column_spacing(1);
    Widget::render(
        table,
        Rect {
            y: inner.y + header_height,
            height: inner.height - header_height,
            ..inner
        },
        buf,
    );
}
