//! Console alert printer
//!
//! [`TerminalNotifier`] is the handler the `run` command registers on the bus:
//! one line per alert on stdout, with the kind highlighted when stdout is a
//! color-capable terminal.

use super::bus::AlertHandler;
use super::types::{Alert, AlertKind};
use std::io::{self, IsTerminal, Write};

/// Prints each alert as one line on stdout
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    colors: bool,
}

impl TerminalNotifier {
    /// Notifier that highlights alert kinds when stdout allows it
    pub fn new() -> Self {
        Self {
            colors: color_enabled(
                io::stdout().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
                std::env::var("TERM").ok().as_deref(),
            ),
        }
    }

    /// Builder: force highlighting on or off
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Render an alert as it is printed
    pub fn format_alert(&self, alert: &Alert) -> String {
        let kind = if self.colors {
            format!("{}{}\x1b[0m", highlight(alert.kind), alert.kind)
        } else {
            alert.kind.to_string()
        };
        format!(
            "{} {:<6} {}  {}",
            alert.timestamp.format("%H:%M:%S"),
            alert.station_id,
            kind,
            alert.message
        )
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertHandler for TerminalNotifier {
    fn handle(&self, alert: &Alert) {
        let line = self.format_alert(alert);
        if let Err(e) = writeln!(io::stdout().lock(), "{}", line) {
            log::warn!("Failed to print alert for station {}: {}", alert.station_id, e);
        }
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

// NO_COLOR wins over everything, then a dumb or missing TERM
fn color_enabled(is_terminal: bool, no_color: bool, term: Option<&str>) -> bool {
    is_terminal && !no_color && term.is_some_and(|t| t != "dumb")
}

fn highlight(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::SensorFailure => "\x1b[1;33m",
        AlertKind::ExtremeConditions => "\x1b[1;31m",
    }
}
