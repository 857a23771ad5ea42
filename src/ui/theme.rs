//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::monitor::{AlertKind, Tone};

/// Color and style theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Color for down alerts and out-of-band report values.
    pub critical: Color,
    /// Color for recovery alerts.
    pub healthy: Color,
    /// Color for the controls/help text and 4xx accents.
    pub info: Color,
    /// Color for the unsuccessful-rate column accent.
    pub unsuccessful: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for table header rows.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            critical: Color::Red,
            healthy: Color::Green,
            info: Color::Yellow,
            unsuccessful: Color::Magenta,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Style for a summary cell of the given tone.
    pub fn cell_style(&self, tone: Tone) -> Style {
        match tone {
            Tone::Normal => Style::default(),
            Tone::Emphasis => Style::default().add_modifier(Modifier::BOLD),
            Tone::Bad => Style::default().fg(self.critical),
        }
    }

    /// Style for an alert log line of the given kind.
    pub fn alert_style(&self, kind: AlertKind) -> Style {
        match kind {
            AlertKind::Down => Style::default().fg(self.critical),
            AlertKind::Recovered => Style::default().fg(self.healthy),
            AlertKind::Lifecycle => Style::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
