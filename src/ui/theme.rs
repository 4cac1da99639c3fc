use conform::config::Config;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub label: Color,
    pub muted: Color,
    pub required: Color,
    pub error: Color,
    pub focus_bg: Color,
    pub chip_bg: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            label: Color::Cyan,
            muted: Color::DarkGray,
            required: Color::Yellow,
            error: Color::Red,
            focus_bg: Color::Rgb(50, 50, 70),
            chip_bg: Color::Rgb(60, 60, 60),
            status_bar_bg: Color::Rgb(40, 40, 40),
            status_bar_fg: Color::White,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Black,
            ..Self::default_theme()
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            label: Color::Blue,
            muted: Color::Gray,
            required: Color::Rgb(180, 130, 0),
            error: Color::Rgb(200, 50, 50),
            focus_bg: Color::Rgb(210, 220, 240),
            chip_bg: Color::Rgb(220, 220, 220),
            status_bar_bg: Color::LightBlue,
            status_bar_fg: Color::Black,
        }
    }

    /// Theme names accepted in config.toml.
    pub const NAMES: [&'static str; 3] = ["default", "dark", "light"];

    pub fn from_config(config: &Config) -> Self {
        match config.theme.as_str() {
            "dark" => Self::dark(),
            "light" => Self::light(),
            _ => Self::default_theme(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_name_is_known() {
        assert!(Theme::NAMES.contains(&Config::default().theme.as_str()));
    }
}
