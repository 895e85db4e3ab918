//! Colour palettes for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Theme;

/// Used for due-soon markers
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for rows being removed
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Used for the light mode accent
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Used for the dark mode accent
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

const PAPER: Color = Color::Rgb(245, 245, 240);
const INK: Color = Color::Rgb(20, 20, 20);
const NIGHT: Color = Color::Rgb(24, 24, 32);

/// Colours for one display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub accent_fg: Color,
    pub muted: Color,
    pub due_soon: Color,
    pub removing: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                bg: PAPER,
                fg: INK,
                accent: DARK_GREEN,
                accent_fg: Color::White,
                muted: Color::Gray,
                due_soon: Color::Rgb(200, 120, 0),
                removing: DARK_RED,
                highlight_bg: Color::Rgb(210, 225, 210),
                highlight_fg: INK,
            },
            Theme::Dark => Palette {
                bg: NIGHT,
                fg: Color::White,
                accent: DARK_PURPLE,
                accent_fg: Color::White,
                muted: Color::DarkGray,
                due_soon: GOLD,
                removing: Color::LightRed,
                highlight_bg: Color::Gray,
                highlight_fg: Color::Black,
            },
        }
    }
}
