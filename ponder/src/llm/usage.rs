//! Process-wide token usage ledger keyed by backend id.
//!
//! Every [`Oracle`](super::Oracle) call records into the same ledger, so usage reported in
//! log entries is cumulative for the whole process, not per instance.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{Backend, LlmUsage};

#[derive(Default, Clone, Copy)]
struct Counters {
    prompt_tokens: u64,
    completion_tokens: u64,
}

static LEDGER: Lazy<DashMap<String, Counters>> = Lazy::new(DashMap::new);

/// Cumulative usage snapshot written into every log entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
    /// Estimated USD cost; 0 when the backend has no known price.
    pub cost: f64,
}

pub(crate) fn record(backend_id: &str, usage: &LlmUsage) {
    let mut entry = LEDGER.entry(backend_id.to_string()).or_default();
    entry.prompt_tokens += u64::from(usage.prompt_tokens);
    entry.completion_tokens += u64::from(usage.completion_tokens);
}

/// Usage recorded so far for `backend_id`, priced with `backend` when given.
pub fn usage_so_far(backend_id: &str, backend: Option<Backend>) -> UsageReport {
    let counters = LEDGER
        .get(backend_id)
        .map(|c| *c.value())
        .unwrap_or_default();
    let cost = backend
        .map(|b| {
            let (prompt_price, completion_price) = b.price_per_1k();
            counters.prompt_tokens as f64 / 1000.0 * prompt_price
                + counters.completion_tokens as f64 / 1000.0 * completion_price
        })
        .unwrap_or(0.0);
    UsageReport {
        completion_tokens: counters.completion_tokens,
        prompt_tokens: counters.prompt_tokens,
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Unknown backend id reports zero usage.
    #[test]
    fn unknown_backend_id_is_zero() {
        let r = usage_so_far("usage-test-never-recorded", Some(Backend::Gpt4));
        assert_eq!(r, UsageReport::default());
    }

    /// **Scenario**: Records accumulate per id and do not leak into other ids.
    #[test]
    fn records_accumulate_per_backend_id() {
        let u = LlmUsage {
            prompt_tokens: 10,
            completion_tokens: 4,
            total_tokens: 14,
        };
        record("usage-test-a", &u);
        record("usage-test-a", &u);
        record("usage-test-b", &u);
        let a = usage_so_far("usage-test-a", None);
        assert_eq!(a.prompt_tokens, 20);
        assert_eq!(a.completion_tokens, 8);
        assert_eq!(a.cost, 0.0);
        assert_eq!(usage_so_far("usage-test-b", None).prompt_tokens, 10);
    }

    /// **Scenario**: Cost uses per-1k prices of the backend.
    #[test]
    fn cost_uses_backend_prices() {
        let u = LlmUsage {
            prompt_tokens: 2000,
            completion_tokens: 1000,
            total_tokens: 3000,
        };
        record("usage-test-priced", &u);
        let r = usage_so_far("usage-test-priced", Some(Backend::Gpt35Turbo));
        assert!((r.cost - (2.0 * 0.0015 + 1.0 * 0.002)).abs() < 1e-12);
    }
}
