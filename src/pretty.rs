//! Console rendering of job logs, outcomes and traces.

use crate::backend::types::{Assignment, LogEntry, LogLevel, Trace};
use crate::classifier::Outcome;
use chrono::{DateTime, Local};
use crossterm::style::Stylize;

fn format_timestamp(timestamp: Option<f64>) -> String {
    timestamp
        .and_then(|secs| {
            let nanos = (secs.fract() * 1e9) as u32;
            DateTime::from_timestamp(secs.trunc() as i64, nanos)
        })
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

pub fn render_entry(entry: &LogEntry) -> String {
    let time = format_timestamp(entry.timestamp);
    let line = match entry.level {
        LogLevel::Info => format!("{} {}", "ℹ".blue(), entry.content.as_str().blue()),
        LogLevel::Success => format!("{} {}", "✔".green(), entry.content.as_str().green()),
        LogLevel::Warning => format!("{} {}", "⚠".yellow(), entry.content.as_str().yellow()),
        LogLevel::Error => format!("{} {}", "✘".red(), entry.content.as_str().red()),
    };
    format!("{} {}", time.dark_grey(), line)
}

pub fn render_outcome(outcome: &Outcome, unsafe_markings: usize) -> String {
    match outcome {
        Outcome::Unsafe => format!(
            "{} Unsafe markings found: {}",
            "System is UNSAFE!".red().bold(),
            unsafe_markings
        ),
        Outcome::Safe => format!(
            "{} No unsafe markings are reachable.",
            "System is SAFE!".green().bold()
        ),
        Outcome::Error(message) => format!("{} {}", "Analysis failed:".red().bold(), message),
    }
}

fn render_state(state: &Assignment) -> String {
    let values: Vec<String> = state.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", values.join(", "))
}

/// Render a trace as a linear chain, one `transition → state` node per line.
pub fn render_trace(trace: &Trace) -> String {
    trace
        .iter()
        .enumerate()
        .map(|(index, (transition, state))| {
            let arrow = if index == 0 { "  " } else { "→ " };
            format!("{}{:<12} {}", arrow, transition, render_state(state))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::step;

    #[test]
    fn test_render_trace_is_linear() {
        let trace = vec![step("initial", &[("x", 0)]), step("t1", &[("x", 1), ("y", 2)])];
        let rendered = render_trace(&trace);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("initial") && lines[0].contains("{x=0}"));
        assert!(lines[1].starts_with("→ t1") && lines[1].contains("{x=1, y=2}"));
    }

    #[test]
    fn test_missing_timestamp_renders_placeholder() {
        assert_eq!(format_timestamp(None), "--:--:--");
    }
}
