use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One finished reminder run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub task: String,
    pub interval_secs: u64,
    pub fires: u64,
    pub started_at: DateTime<Local>,
    pub stopped_at: DateTime<Local>,
}

pub fn history_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nudge")
        .join("history.jsonl")
}

pub fn append_entry(path: &Path, entry: &RunRecord) -> crate::error::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let mut json = serde_json::to_string(entry)?;
    json.push('\n');
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn read_entries(path: &Path) -> Vec<RunRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

pub fn summary(entries: &[RunRecord], now: DateTime<Local>) -> String {
    if entries.is_empty() {
        return "No reminders logged yet.\n".to_string();
    }

    let today = now.date_naive();
    let days_since_monday = now.weekday().num_days_from_monday();
    let week_start = today - chrono::Duration::days(days_since_monday as i64);

    let today_entries: Vec<&RunRecord> = entries
        .iter()
        .filter(|e| e.started_at.date_naive() == today)
        .collect();
    let week_entries: Vec<&RunRecord> = entries
        .iter()
        .filter(|e| e.started_at.date_naive() >= week_start)
        .collect();

    let mut out = section("Today", &today_entries);
    out.push('\n');
    out.push_str(&section("This week", &week_entries));
    out
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn section(title: &str, entries: &[&RunRecord]) -> String {
    let total_fires: u64 = entries.iter().map(|e| e.fires).sum();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{title} ({}, {}):",
        plural(entries.len(), "run"),
        plural(total_fires as usize, "reminder")
    );

    if entries.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }

    let mut by_task: HashMap<&str, (usize, u64)> = HashMap::new();
    for e in entries {
        let slot = by_task.entry(e.task.as_str()).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += e.fires;
    }

    let mut tasks: Vec<_> = by_task.into_iter().collect();
    tasks.sort_by(|a, b| b.1.1.cmp(&a.1.1).then_with(|| a.0.cmp(&b.0)));

    for (task, (runs, fires)) in tasks {
        let _ = writeln!(out, "  {task:<24} x{runs:<4} {fires} sent");
    }
    out
}

pub fn print_summary() {
    print!("{}", summary(&read_entries(&history_path()), Local::now()));
}
