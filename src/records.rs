//! Match record leaderboard
//!
//! Persisted to LocalStorage, tracks the ten fastest wins (fewest turns).

use serde::{Deserialize, Serialize};

use crate::sim::PlayerColor;

/// Maximum number of records to keep
pub const MAX_RECORDS: usize = 10;

/// A single finished-match entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Winner's initials
    pub initials: String,
    /// Winner's token color
    pub color: PlayerColor,
    /// Seats in the match (2-4)
    pub player_count: u8,
    /// Turns the whole match took; lower ranks higher
    pub turns_taken: u32,
    /// Wormholes executed during the match
    pub wormholes: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Fastest-win leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatchRecords {
    pub entries: Vec<MatchRecord>,
}

impl MatchRecords {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "wormhole_warp_records";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a finished match qualifies for the board
    pub fn qualifies(&self, turns_taken: u32) -> bool {
        if turns_taken == 0 {
            return false;
        }
        if self.entries.len() < MAX_RECORDS {
            return true;
        }
        self.entries
            .last()
            .map(|e| turns_taken < e.turns_taken)
            .unwrap_or(true)
    }

    /// Rank a turn count would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, turns_taken: u32) -> Option<usize> {
        if !self.qualifies(turns_taken) {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| turns_taken < e.turns_taken);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a record (if it qualifies), keeping ascending turn order.
    /// Returns the rank achieved (1-indexed) or None.
    pub fn add_record(&mut self, record: MatchRecord) -> Option<usize> {
        if !self.qualifies(record.turns_taken) {
            return None;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| record.turns_taken < e.turns_taken);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, record);
                i + 1
            }
            None => {
                self.entries.push(record);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_RECORDS);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fastest win so far (if any)
    pub fn top_entry(&self) -> Option<&MatchRecord> {
        self.entries.first()
    }

    /// Load records from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(records) = serde_json::from_str::<MatchRecords>(&json) {
                    log::info!("Loaded {} match records", records.entries.len());
                    return records;
                }
            }
        }

        log::info!("No match records found, starting fresh");
        Self::new()
    }

    /// Save records to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Match records saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let diff_secs = (js_sys::Date::now() - timestamp) / 1000.0;
    let diff_mins = diff_secs / 60.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 7.0 {
        let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
        format!(
            "{}/{}/{}",
            date.get_month() + 1,
            date.get_date(),
            date.get_full_year() % 100
        )
    } else if diff_days >= 1.0 {
        let days = diff_days.floor() as i32;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        format!("{} hr ago", diff_hours.floor() as i32)
    } else if diff_mins >= 1.0 {
        format!("{} min ago", diff_mins.floor() as i32)
    } else {
        "Just now".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(_timestamp: f64) -> String {
    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(turns: u32) -> MatchRecord {
        MatchRecord {
            initials: "ABC".to_string(),
            color: PlayerColor::Crimson,
            player_count: 2,
            turns_taken: turns,
            wormholes: 3,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_fewest_turns_ranks_first() {
        let mut records = MatchRecords::new();
        assert_eq!(records.add_record(record(40)), Some(1));
        assert_eq!(records.add_record(record(25)), Some(1));
        assert_eq!(records.add_record(record(30)), Some(2));
        assert_eq!(records.top_entry().map(|e| e.turns_taken), Some(25));
    }

    #[test]
    fn test_board_truncates_at_max() {
        let mut records = MatchRecords::new();
        for turns in 10..25 {
            records.add_record(record(turns));
        }
        assert_eq!(records.entries.len(), MAX_RECORDS);
        // Slowest surviving entry is 19; a 30-turn match no longer qualifies
        assert!(!records.qualifies(30));
        assert!(records.qualifies(15));
        assert_eq!(records.potential_rank(9), Some(1));
    }

    #[test]
    fn test_zero_turns_never_qualifies() {
        let records = MatchRecords::new();
        assert!(!records.qualifies(0));
        assert_eq!(records.potential_rank(0), None);
    }
}
