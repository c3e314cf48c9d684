// src/formatting.rs

use crate::core::{Console, Record};

/// Formats the console line reported for each recorded tick.
///
/// Percentages use their shortest representation (`2.0` is printed as `2`);
/// memory sizes are whole MiB.
pub fn format_status_line(record: &Record) -> String {
    format!(
        "ts: {:.3}, cpu: {}%, mem: {}%, rss: {} MiB, vsz: {} MiB",
        record.display_seconds(),
        record.cpu_percent,
        record.mem_percent,
        record.rss_mib(),
        record.vsz_mib()
    )
}

/// Writes status lines to stdout. Diagnostics go to stderr through `tracing`,
/// so stdout carries nothing but samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn status(&self, line: &str) {
        println!("{}", line);
    }
}
