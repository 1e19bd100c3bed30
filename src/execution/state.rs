use chrono::{DateTime, Utc};

/// State carried from one polling cycle to the next
///
/// Owned by the scheduler and lent to each cycle; nothing else mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    pub last_order_opened_at: Option<DateTime<Utc>>,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_order(&mut self, at: DateTime<Utc>) {
        self.last_order_opened_at = Some(at);
    }

    pub fn clear(&mut self) {
        self.last_order_opened_at = None;
    }

    /// True once the tracked order has been open strictly longer than `timeout`
    pub fn is_timed_out(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.last_order_opened_at
            .map(|opened| now - opened > timeout)
            .unwrap_or(false)
    }
}
