use crossterm::style::{style, Color, Stylize};

/// ANSI coloring for the pretty renderer. Disabled palettes pass text
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub const fn plain() -> Self {
        Self::new(false)
    }

    /// Colors are on unless `--no-color` was passed or `NO_COLOR` is set to
    /// a non-empty value.
    pub fn from_env(no_color_flag: bool) -> Self {
        let env_off = std::env::var("NO_COLOR").map(|v| !v.is_empty()).unwrap_or(false);
        Self::new(!no_color_flag && !env_off)
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, Color::Green)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, Color::Yellow)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, Color::Red)
    }
}
