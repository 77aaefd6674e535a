//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::Alert;
use crate::cli::args::OutputFormat;
use crate::domain::{SensorReading, ThresholdConfig};
use crate::station::{ManagerView, StationView};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

impl TableDisplay for StationView {
    fn to_table(&self) -> String {
        let stats = &self.statistics;
        let mut output = format!("Station {} ({})\n", self.id, self.state);
        output.push_str(&format!("  Readings:            {}\n", stats.readings));
        output.push_str(&format!("  Total Alerts:        {}\n", stats.total_alerts));
        output.push_str(&format!("  Sensor Failures:     {}\n", stats.sensor_failure));
        output.push_str(&format!(
            "  Extreme Conditions:  {}\n",
            stats.extreme_conditions
        ));
        if let Some(at) = stats.last_alert_at {
            output.push_str(&format!(
                "  Last Alert:          {}\n",
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        output
    }

    fn to_compact(&self) -> String {
        format!(
            "{}: {} alerts ({} failure, {} extreme) in {} readings",
            self.id,
            self.statistics.total_alerts,
            self.statistics.sensor_failure,
            self.statistics.extreme_conditions,
            self.statistics.readings
        )
    }
}

impl TableDisplay for ManagerView {
    fn to_table(&self) -> String {
        let mut output = String::from("Monitoring Summary\n");
        output.push_str("══════════════════════════════════════════\n");

        for station in &self.stations {
            output.push_str(&station.to_table());
            output.push('\n');
        }

        output.push_str(&format!(
            "Stations: {}  Total Alerts: {}",
            self.stations.len(),
            self.total_alerts
        ));
        output
    }

    fn to_compact(&self) -> String {
        let mut parts: Vec<String> = self.stations.iter().map(|s| s.to_compact()).collect();
        parts.push(format!("total {}", self.total_alerts));
        parts.join(", ")
    }
}

/// Effective thresholds of one station
#[derive(Debug, Clone, Serialize)]
pub struct StationConfigView {
    pub id: String,
    pub thresholds: ThresholdConfig,
}

impl TableDisplay for StationConfigView {
    fn to_table(&self) -> String {
        let mut output = format!("Station {}\n", self.id);
        for (key, value) in self.thresholds.entries() {
            output.push_str(&format!("  {:<24} {} {}\n", key.as_str(), value, key.unit()));
        }
        output
    }

    fn to_compact(&self) -> String {
        let fields: Vec<String> = self
            .thresholds
            .entries()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("{}: {}", self.id, fields.join(" "))
    }
}

/// Effective configuration of every station
#[derive(Debug, Clone, Serialize)]
pub struct ConfigOutput {
    pub stations: Vec<StationConfigView>,
}

impl TableDisplay for ConfigOutput {
    fn to_table(&self) -> String {
        self.stations
            .iter()
            .map(|s| s.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.stations
            .iter()
            .map(|s| s.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Classification of a single reading
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutput {
    pub station: String,
    pub reading: SensorReading,
    pub alert: Option<Alert>,
}

impl TableDisplay for EvaluationOutput {
    fn to_table(&self) -> String {
        let mut output = format!("Station {}\n", self.station);
        output.push_str(&format!("  Reading: {}\n", self.reading));
        match &self.alert {
            Some(alert) => {
                output.push_str(&format!("  Alert:   {}\n", alert.kind));
                for condition in &alert.conditions {
                    output.push_str(&format!("    • {}\n", condition));
                }
                if alert.conditions.is_empty() {
                    output.push_str(&format!("    • {}\n", alert.message));
                }
            }
            None => output.push_str("  Alert:   none\n"),
        }
        output
    }

    fn to_compact(&self) -> String {
        match &self.alert {
            Some(alert) => alert.to_string(),
            None => format!("[{}] no alert", self.station),
        }
    }
}
