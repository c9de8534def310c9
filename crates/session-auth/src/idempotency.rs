//! Ledger of callback redirects this client has already acted on.
//!
//! Authorization codes are single-use, so a claimed key is never released.
//! The ledger only grows by one entry per redirect for the life of the handler.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    InFlight,
    Done,
}

/// What a `claim` found for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First sighting; the caller owns the processing.
    Acquired,
    /// Another call is still processing this redirect.
    InFlight,
    /// This redirect was processed before.
    Processed,
}

#[derive(Debug, Default)]
pub struct CallbackLedger {
    entries: HashMap<String, Progress>,
}

impl CallbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, key: &str) -> Claim {
        match self.entries.get(key) {
            Some(Progress::InFlight) => Claim::InFlight,
            Some(Progress::Done) => Claim::Processed,
            None => {
                self.entries.insert(key.to_string(), Progress::InFlight);
                Claim::Acquired
            }
        }
    }

    /// Mark a claimed key as processed. It stays claimed afterwards.
    pub fn finish(&mut self, key: &str) {
        self.entries.insert(key.to_string(), Progress::Done);
    }
}

#[cfg(test)]
mod tests {
    use super::{CallbackLedger, Claim};

    #[test]
    fn test_first_claim_acquires_then_reports_in_flight() {
        let mut ledger = CallbackLedger::new();

        assert_eq!(ledger.claim("code:abc"), Claim::Acquired);
        assert_eq!(ledger.claim("code:abc"), Claim::InFlight);
        assert_eq!(ledger.claim("code:other"), Claim::Acquired);
    }

    #[test]
    fn test_finished_key_stays_processed() {
        let mut ledger = CallbackLedger::new();
        assert_eq!(ledger.claim("code:abc"), Claim::Acquired);
        ledger.finish("code:abc");

        for _ in 0..3 {
            assert_eq!(ledger.claim("code:abc"), Claim::Processed);
        }
    }
}
