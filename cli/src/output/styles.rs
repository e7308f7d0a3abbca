//! Terminal palette for summaries and messages.
//!
//! Host lines are styled by `Tone`, the same grouping the monitor uses, so
//! the final summary and the live view agree on colour.

use owo_colors::Style;

use crate::domain::Tone;

/// Styles for every kind of line `OutputContext` prints. `Default` is plain.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    /// Also used for hosts still in progress.
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    /// Keys in key/value lines.
    pub dim: Style,
    pub header: Style,
}

impl Styles {
    /// Palette used on a colour terminal.
    #[must_use]
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            header: Style::new().bold().cyan(),
        }
    }

    /// Style of a host line: green when settled, red on failure, yellow otherwise.
    #[must_use]
    pub fn tone(&self, tone: Tone) -> Style {
        match tone {
            Tone::Success => self.success,
            Tone::Failure => self.error,
            Tone::Pending => self.warning,
        }
    }
}
