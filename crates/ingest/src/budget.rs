//! Execution time budget

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Remaining execution allowance for the current invocation
pub trait TimeBudget: Send + Sync {
    fn remaining_millis(&self) -> u64;
}

/// Budget derived from an absolute deadline in epoch milliseconds
#[derive(Debug, Clone, Copy)]
pub struct DeadlineBudget {
    deadline_ms: u64,
}

impl DeadlineBudget {
    pub fn new(deadline_ms: u64) -> Self {
        Self { deadline_ms }
    }
}

impl TimeBudget for DeadlineBudget {
    fn remaining_millis(&self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.deadline_ms.saturating_sub(now_ms)
    }
}

/// Budget that never runs out
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl TimeBudget for Unbounded {
    fn remaining_millis(&self) -> u64 {
        u64::MAX
    }
}

/// Budget returning a fixed sequence of readings, then repeating the last one
#[derive(Debug, Default)]
pub struct ScriptedBudget {
    readings: Mutex<VecDeque<u64>>,
    last: Mutex<u64>,
}

impl ScriptedBudget {
    pub fn new(readings: impl IntoIterator<Item = u64>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            last: Mutex::new(u64::MAX),
        }
    }
}

impl TimeBudget for ScriptedBudget {
    fn remaining_millis(&self) -> u64 {
        let next = self.readings.lock().ok().and_then(|mut r| r.pop_front());
        let mut last = match self.last.lock() {
            Ok(last) => last,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(reading) = next {
            *last = reading;
        }
        *last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_in_past_is_zero() {
        assert_eq!(DeadlineBudget::new(0).remaining_millis(), 0);
    }

    #[test]
    fn test_deadline_in_future() {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let remaining = DeadlineBudget::new(now_ms + 60_000).remaining_millis();
        assert!(remaining > 50_000 && remaining <= 60_000);
    }

    #[test]
    fn test_scripted_readings() {
        let budget = ScriptedBudget::new([30_000, 5_000]);
        assert_eq!(budget.remaining_millis(), 30_000);
        assert_eq!(budget.remaining_millis(), 5_000);
        assert_eq!(budget.remaining_millis(), 5_000);
    }
}
