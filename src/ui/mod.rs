//! UI rendering module for topanime
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod anime_detail;
pub mod anime_list;
pub mod help_overlay;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Block,
    Frame,
};

use crate::app::App;
use topanime::theme::Theme;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub accent: Color,
    pub muted: Color,
    pub key: Color,
    pub error: Color,
    pub score: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                background: Color::Reset,
                text: Color::White,
                accent: Color::Cyan,
                muted: Color::DarkGray,
                key: Color::Yellow,
                error: Color::Red,
                score: Color::Green,
            },
            Theme::Light => Palette {
                background: Color::White,
                text: Color::Black,
                accent: Color::Blue,
                muted: Color::Gray,
                key: Color::Magenta,
                error: Color::Red,
                score: Color::Green,
            },
        }
    }
}

/// Draws the whole screen: list, then the detail and help overlays on top
pub fn render(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        frame.area(),
    );

    anime_list::render(frame, app, &palette);

    if app.detail_open() {
        anime_detail::render(frame, app, &palette);
    }
    if app.show_help {
        help_overlay::render(frame, &palette);
    }
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::tests::{full_page, loaded_app};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    /// Renders `app` into an in-memory terminal and returns the screen text
    pub(crate) fn render_to_string(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|frame| render(frame, app)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(Palette::for_theme(Theme::Dark), Palette::for_theme(Theme::Light));
    }

    #[test]
    fn test_centered_rect_fits_small_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(50, 30, area);
        assert!(rect.width <= 20);
        assert!(rect.height <= 10);
    }

    #[test]
    fn test_help_overlay_drawn_over_list() {
        let mut app = loaded_app(full_page(1));
        app.handle_key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE));

        let content = render_to_string(&app, 100, 30);

        assert!(content.contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_light_theme_paints_background() {
        let mut app = loaded_app(full_page(1));
        app.theme = Theme::Light;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer.content()[buffer.content().len() - 1].bg, Color::White);
    }
}
