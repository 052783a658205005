//! Top list screen rendering
//!
//! Renders the header (search box, type filter, result count), the scrolling
//! list of titles with rank, type, score and episodes, and the status and key
//! hint lines at the bottom.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::Palette;
use crate::app::{App, InputMode};
use topanime::catalog::ListState;
use topanime::data::ListItem;

/// Width of the rank, type, score and episode columns plus cursor and gaps
const FIXED_COLUMNS: usize = 2 + 6 + 1 + 8 + 1 + 5 + 1 + 7;

/// Renders the list screen
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state containing the list and selection
/// * `palette` - Colors of the active theme
pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = frame.area();

    // Create main layout with header, content area, status and help text at bottom
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // List
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_header(frame, app, palette, chunks[0]);
    render_list(frame, app, palette, chunks[1]);
    render_status(frame, app, palette, chunks[2]);
    render_help(frame, palette, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let visible = app.visible_items().len();
    let total = app.catalog.items().len();

    let count = if visible == total {
        format!("{} titles", total)
    } else {
        format!("{} of {} titles", visible, total)
    };

    let search = if app.input_mode == InputMode::Search {
        Span::styled(
            format!("Search: {}_", app.query),
            Style::default().fg(palette.key),
        )
    } else if app.query.is_empty() {
        Span::styled("Press / to search", Style::default().fg(palette.muted))
    } else {
        Span::styled(
            format!("Search: {}", app.query),
            Style::default().fg(palette.text),
        )
    };

    let separator = "─".repeat((area.width as usize).saturating_sub(2));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "TOP ANIME",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(count, Style::default().fg(palette.text)),
            Span::raw("  "),
            Span::styled(
                format!("Type: {}", app.kind_filter.label()),
                Style::default().fg(palette.key),
            ),
        ]),
        Line::from(search),
        Line::from(Span::styled(separator, Style::default().fg(palette.muted))),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_list(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .title(" Top Anime ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    let items = app.visible_items();

    if items.is_empty() {
        let message = empty_message(app);
        let paragraph = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(palette.muted),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(app.selected_index, height);
    let title_width = (area.width as usize)
        .saturating_sub(2 + FIXED_COLUMNS)
        .max(8);

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, item)| row(item, index == app.selected_index, title_width, palette))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// First row index to draw so the selection stays on screen
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

fn row<'a>(item: &ListItem, selected: bool, title_width: usize, palette: &Palette) -> Line<'a> {
    let cursor = if selected { "\u{25B8} " } else { "  " }; // ▸ or space

    let title_style = if selected {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text)
    };

    // Format: "▸ #1    Sousou no Frieren           TV       9.3   28 ep"
    Line::from(vec![
        Span::styled(cursor, Style::default().fg(palette.accent)),
        Span::styled(
            format!("{:<6}", item.rank_label()),
            Style::default().fg(palette.muted),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:<width$}", truncate(&item.title, title_width), width = title_width),
            title_style,
        ),
        Span::styled(format!("{:<8}", item.kind.label()), Style::default().fg(palette.key)),
        Span::raw(" "),
        Span::styled(format!("{:>5}", item.score_label()), Style::default().fg(palette.score)),
        Span::raw(" "),
        Span::styled(
            format!("{:>4} ep", item.episodes_label()),
            Style::default().fg(palette.muted),
        ),
    ])
}

/// Cuts `s` to at most `width` characters, marking the cut with an ellipsis
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn empty_message(app: &App) -> String {
    match app.catalog.state() {
        ListState::Empty | ListState::Loading => "Loading top anime...".to_string(),
        ListState::Error if app.catalog.items().is_empty() => match app.catalog.error() {
            Some(e) => format!("Could not load the list: {}. Press R to retry.", e),
            None => "Could not load the list. Press R to retry.".to_string(),
        },
        _ if app.catalog.items().is_empty() => "No titles".to_string(),
        _ => "No titles match the current search and type filter".to_string(),
    }
}

/// Formats how long ago `at` was
pub(crate) fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - at;
    let mins_ago = elapsed.num_minutes();
    if mins_ago < 1 {
        "just now".to_string()
    } else if mins_ago < 60 {
        format!("{}m ago", mins_ago)
    } else {
        format!("{}h ago", elapsed.num_hours())
    }
}

/// Text of the status line
pub(crate) fn status_text(app: &App, now: DateTime<Utc>) -> String {
    let catalog = &app.catalog;
    let mut parts = Vec::new();

    match catalog.state() {
        ListState::Empty => {}
        ListState::Loading => parts.push("Loading...".to_string()),
        ListState::LoadingMore => {
            parts.push(format!("Loading page {}...", catalog.page().saturating_add(1)))
        }
        ListState::Error => {
            let reason = catalog
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "Request failed".to_string());
            parts.push(format!("Error: {} (R to retry)", reason));
        }
        ListState::Ready => parts.push(format!("Page {}", catalog.page())),
    }

    if let Some(at) = catalog.cached_at() {
        parts.push(format!("Cached {}", format_age(at, now)));
    }

    if !catalog.items().is_empty() {
        if catalog.has_more() {
            parts.push("More available (m)".to_string());
        } else {
            parts.push("End of list".to_string());
        }
    }

    parts.join(" │ ")
}

fn render_status(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let color = if app.catalog.state() == ListState::Error {
        palette.error
    } else {
        palette.text
    };
    let paragraph = Paragraph::new(status_text(app, Utc::now())).style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

/// Renders the key hints at the bottom of the screen
fn render_help(frame: &mut Frame, palette: &Palette, area: Rect) {
    let key = Style::default().fg(palette.key);
    let help_spans = vec![
        Span::styled("↑/↓", key),
        Span::raw(" Navigate  "),
        Span::styled("Enter", key),
        Span::raw(" Details  "),
        Span::styled("/", key),
        Span::raw(" Search  "),
        Span::styled("t", key),
        Span::raw(" Type  "),
        Span::styled("m", key),
        Span::raw(" More  "),
        Span::styled("?", key),
        Span::raw(" Help  "),
        Span::styled("q", key),
        Span::raw(" Quit"),
    ];

    let paragraph = Paragraph::new(Line::from(help_spans)).style(Style::default().fg(palette.muted));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{full_page, item, loaded_app, test_app};
    use crate::tasks::{FetchMessage, Job};
    use crate::ui::tests::render_to_string;
    use chrono::Duration;
    use topanime::data::{AnimeKind, FetchError, Page, PAGE_SIZE};

    #[test]
    fn test_render_produces_non_empty_buffer() {
        let app = loaded_app(full_page(1));
        let content = render_to_string(&app, 100, 30);
        assert!(content.contains("TOP ANIME"));
        assert!(content.contains("25 titles"));
    }

    #[test]
    fn test_rows_show_rank_title_type_score_episodes() {
        let app = loaded_app(Page {
            items: vec![item(1, "Fullmetal Alchemist: Brotherhood", AnimeKind::Tv)],
            is_last_page: true,
        });

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("#1"));
        assert!(content.contains("Fullmetal Alchemist: Brotherhood"));
        assert!(content.contains("TV"));
        assert!(content.contains("9.1"));
        assert!(content.contains("24 ep"));
    }

    #[test]
    fn test_selected_item_is_highlighted() {
        let mut app = loaded_app(full_page(1));
        app.selected_index = 1;

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("\u{25B8} #2"), "Cursor should mark the second row");
    }

    #[test]
    fn test_list_scrolls_to_keep_selection_visible() {
        let mut app = loaded_app(full_page(1));
        app.selected_index = PAGE_SIZE - 1;

        let content = render_to_string(&app, 100, 15);

        assert!(content.contains("Anime 25"));
        assert!(!content.contains("Anime 1 "));
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(5, 0), 0);
    }

    #[test]
    fn test_truncate_long_titles() {
        assert_eq!(truncate("Gintama", 10), "Gintama");
        assert_eq!(truncate("Steins;Gate 0", 8), "Steins;…");
    }

    #[test]
    fn test_loading_message_before_first_page() {
        let (mut app, _slot) = test_app();
        app.start(false);

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("Loading top anime..."));
    }

    #[test]
    fn test_error_with_empty_list_offers_retry() {
        let (mut app, _slot) = test_app();
        app.start(false);
        let request = match app.take_jobs().as_slice() {
            [Job::Page(request)] => *request,
            other => panic!("expected one page job, got {:?}", other),
        };
        app.handle_message(FetchMessage::PageLoaded {
            request,
            result: Err(FetchError::ServerStatus(503)),
        });

        let content = render_to_string(&app, 120, 30);

        assert!(content.contains("API 503"));
        assert!(content.contains("Press R to retry"));
    }

    #[test]
    fn test_no_match_message() {
        let mut app = loaded_app(full_page(1));
        app.query = "zzz".to_string();

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("No titles match"));
        assert!(content.contains("0 of 25 titles"));
    }

    #[test]
    fn test_status_text_ready_with_more() {
        let app = loaded_app(full_page(1));
        let now = app.catalog.cached_at().unwrap() + Duration::minutes(5);

        let text = status_text(&app, now);

        assert_eq!(text, "Page 1 │ Cached 5m ago │ More available (m)");
    }

    #[test]
    fn test_status_text_end_of_list() {
        let mut page = full_page(1);
        page.items.truncate(3);
        page.is_last_page = true;
        let app = loaded_app(page);

        let text = status_text(&app, Utc::now());

        assert!(text.ends_with("End of list"));
    }

    #[test]
    fn test_status_text_error_keeps_reason() {
        let mut app = loaded_app(full_page(1));
        app.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('m'),
            crossterm::event::KeyModifiers::NONE,
        ));
        let request = match app.take_jobs().as_slice() {
            [Job::Page(request)] => *request,
            other => panic!("expected one page job, got {:?}", other),
        };
        app.handle_message(FetchMessage::PageLoaded {
            request,
            result: Err(FetchError::Timeout),
        });

        let text = status_text(&app, Utc::now());

        assert!(text.starts_with("Error: Request timed out (R to retry)"));
    }

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now - Duration::minutes(42), now), "42m ago");
        assert_eq!(format_age(now - Duration::minutes(130), now), "2h ago");
    }

    #[test]
    fn test_search_prompt_shown_while_typing() {
        let mut app = loaded_app(full_page(1));
        app.input_mode = InputMode::Search;
        app.query = "frieren".to_string();

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("Search: frieren_"));
    }
}
