//! Tauri Commands for reading the application log

/// Latest log lines, oldest first. `limit` keeps only the newest ones.
#[tauri::command]
pub fn get_recent_logs(limit: Option<usize>) -> Vec<String> {
    newest(rolling_logger::recent_lines(), limit)
}

fn newest(mut lines: Vec<String>, limit: Option<usize>) -> Vec<String> {
    if let Some(limit) = limit {
        let skip = lines.len().saturating_sub(limit);
        lines.drain(..skip);
    }
    lines
}
