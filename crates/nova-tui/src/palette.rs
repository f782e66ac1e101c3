use nova_core::Theme;
use ratatui::style::Color;

/// Terminal colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub user: Color,
    pub model: Color,
    pub muted: Color,
    pub border: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub header_bg: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Midnight => Palette {
            accent: Color::Cyan,
            user: Color::LightBlue,
            model: Color::White,
            muted: Color::DarkGray,
            border: Color::Blue,
            highlight_bg: Color::Blue,
            highlight_fg: Color::White,
            header_bg: Color::Rgb(15, 23, 42),
        },
        Theme::Neon => Palette {
            accent: Color::Magenta,
            user: Color::LightMagenta,
            model: Color::LightCyan,
            muted: Color::Gray,
            border: Color::Magenta,
            highlight_bg: Color::Magenta,
            highlight_fg: Color::Black,
            header_bg: Color::Rgb(20, 0, 40),
        },
        Theme::Solar => Palette {
            accent: Color::Yellow,
            user: Color::LightYellow,
            model: Color::Rgb(255, 179, 71),
            muted: Color::DarkGray,
            border: Color::Yellow,
            highlight_bg: Color::Yellow,
            highlight_fg: Color::Black,
            header_bg: Color::Rgb(60, 30, 0),
        },
        Theme::Pastel => Palette {
            accent: Color::LightMagenta,
            user: Color::LightCyan,
            model: Color::LightGreen,
            muted: Color::Gray,
            border: Color::LightBlue,
            highlight_bg: Color::LightMagenta,
            highlight_fg: Color::Black,
            header_bg: Color::Rgb(70, 60, 90),
        },
    }
}
