//! Detail overlay rendering
//!
//! Shows the full record of the selected title in a centered modal: score,
//! episodes, aired dates, genres, synopsis and the source link.

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, Palette};
use crate::app::App;
use topanime::data::DetailItem;
use topanime::detail::DetailState;

/// Renders the detail overlay on top of the list
pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = frame.area();
    let overlay_area = centered_rect(
        area.width.saturating_sub(8).min(80),
        area.height.saturating_sub(4).min(24),
        area,
    );

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let (title, lines) = match app.detail.state() {
        DetailState::Idle => return,
        DetailState::Loading { id } => (
            format!(" Anime {} ", id),
            vec![Line::from(Span::styled(
                "Loading details...",
                Style::default().fg(palette.muted),
            ))],
        ),
        DetailState::Failed { id, message } => (
            format!(" Anime {} ", id),
            vec![
                Line::from(Span::styled(
                    format!("Failed to load details: {}", message),
                    Style::default().fg(palette.error),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc to close",
                    Style::default().fg(palette.muted),
                )),
            ],
        ),
        DetailState::Ready(detail) => (format!(" {} ", detail.title), detail_lines(detail, palette)),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().bg(palette.background).fg(palette.text));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, overlay_area);
}

fn field<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{:<10}", label),
            Style::default()
                .fg(palette.key)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, Style::default().fg(palette.text)),
    ])
}

fn detail_lines<'a>(detail: &DetailItem, palette: &Palette) -> Vec<Line<'a>> {
    let genres = if detail.genres.is_empty() {
        "-".to_string()
    } else {
        detail.genres.join(", ")
    };

    vec![
        field("Score", detail.score_label(), palette),
        field("Episodes", detail.episodes_label(), palette),
        field("Aired", detail.aired.clone(), palette),
        field("Genres", genres, palette),
        Line::from(""),
        Line::from(Span::styled(
            detail.synopsis.clone(),
            Style::default().fg(palette.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            detail.source_url.clone(),
            Style::default().fg(palette.accent),
        )),
        Line::from(Span::styled(
            "Esc to close",
            Style::default().fg(palette.muted),
        )),
    ]
}
