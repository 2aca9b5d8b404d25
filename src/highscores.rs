//! Best score record
//!
//! A single value persisted to LocalStorage as a plain number.

use crate::platform::storage;

/// Best score across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "pearl_shell_best";

    pub fn new() -> Self {
        Self { best: 0 }
    }

    /// Check if a score beats the record
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.best
    }

    /// Offer a finished run's score. Returns true if it set a new record.
    pub fn submit(&mut self, score: u64) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.best = score;
        true
    }

    /// Parse a stored value; anything unparseable counts as no record
    pub fn parse(raw: &str) -> Self {
        Self {
            best: raw.trim().parse().unwrap_or(0),
        }
    }

    /// Load the record from storage
    pub fn load() -> Self {
        match storage::get_item(Self::STORAGE_KEY) {
            Some(raw) => {
                let record = Self::parse(&raw);
                log::info!("Loaded best score {}", record.best);
                record
            }
            None => {
                log::info!("No best score found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save the record to storage
    pub fn save(&self) {
        if storage::set_item(Self::STORAGE_KEY, &self.best.to_string()) {
            log::info!("Best score saved ({})", self.best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit() {
        let mut hs = HighScore::new();
        assert!(!hs.submit(0));
        assert!(hs.submit(30));
        assert!(!hs.submit(30));
        assert!(!hs.submit(10));
        assert!(hs.submit(40));
        assert_eq!(hs.best, 40);
    }

    #[test]
    fn test_parse_tolerates_garbage() {
        assert_eq!(HighScore::parse("120").best, 120);
        assert_eq!(HighScore::parse(" 7\n").best, 7);
        assert_eq!(HighScore::parse("").best, 0);
        assert_eq!(HighScore::parse("NaN").best, 0);
        assert_eq!(HighScore::parse("-5").best, 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_load_save() {
        storage::remove_item(HighScore::STORAGE_KEY);
        assert_eq!(HighScore::load(), HighScore::new());
        HighScore { best: 90 }.save();
        assert_eq!(HighScore::load().best, 90);
        storage::remove_item(HighScore::STORAGE_KEY);
    }
}
