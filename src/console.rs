use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use toggl_entries::TimeEntry;

/// Consoleにtime entryを表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーを表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;
}

/// タイムエントリーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // time entryをlist形式で表示する。計測中のものは終了時刻を`now`とする。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start_time());

        for entry in sorted_entries {
            writeln!(self.writer, "{}", format_entry(&entry))
                .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }
}

/// 1つのtime entryを`- 09:00 ~ 10:30: description [tag] (#id)`の形式にする。
fn format_entry(entry: &TimeEntry) -> String {
    let start_str = entry
        .start
        .map(|start| start.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let end_str = match entry.stop {
        Some(stop) if !entry.is_running() => stop.with_timezone(&Local).format("%H:%M").to_string(),
        _ => "now".to_string(),
    };

    let mut line = format!("- {} ~ {}: {}", start_str, end_str, entry.description);
    if !entry.tags.is_empty() {
        line.push_str(&format!(" [{}]", entry.tags.iter().collect::<Vec<_>>().join(", ")));
    }
    if let Some(id) = entry.id {
        line.push_str(&format!(" (#{})", id));
    }
    line
}
