//! Activity log — one JSONL line per mutation attempt.
//!
//! Records what the user asked for and how it ended (`~/.domo/activity.jsonl`),
//! so a shared admin box keeps a trail of who-deleted-what even though the
//! server owns the data. Best-effort: write failures are silently ignored.

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One mutation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// Record kind: `"sensor"` or `"housing unit"`.
    pub kind: String,
    /// `"add"` or `"delete"`.
    pub action: String,
    /// `"created"`, `"deleted"`, `"rejected"`, `"failed"`, `"declined"`,
    /// `"incomplete"`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record_id: Option<String>,
    /// Server message, when one was surfaced.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl ActivityEntry {
    pub fn now(kind: &str, action: &str, outcome: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind: kind.to_string(),
            action: action.to_string(),
            outcome: outcome.to_string(),
            record_id: None,
            message: None,
        }
    }

    pub fn with_record_id(mut self, id: &str) -> Self {
        self.record_id = Some(id.to_string());
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Append / read
// ---------------------------------------------------------------------------

/// Append one entry. Best-effort — failures are silently ignored.
pub fn record(entry: &ActivityEntry) {
    let _ = append(entry);
}

fn append(entry: &ActivityEntry) -> anyhow::Result<()> {
    let Some(path) = log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Read every entry, skipping malformed lines. Empty if the file does not
/// exist.
pub fn read_all() -> Vec<ActivityEntry> {
    let Some(path) = log_path() else {
        return Vec::new();
    };

    let Ok(file) = File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Path of the activity log: `~/.domo/activity.jsonl`.
pub fn log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".domo").join("activity.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_through_jsonl() {
        let entry = ActivityEntry::now("sensor", "delete", "deleted")
            .with_record_id("7")
            .with_message("Capteur supprimé avec succès!");
        let line = serde_json::to_string(&entry).unwrap();
        let back: ActivityEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back.kind, "sensor");
        assert_eq!(back.record_id.as_deref(), Some("7"));
        assert_eq!(back.message.as_deref(), Some("Capteur supprimé avec succès!"));
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let entry = ActivityEntry::now("housing unit", "add", "incomplete");
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains("record_id"));
        assert!(!line.contains("message"));
    }
}
