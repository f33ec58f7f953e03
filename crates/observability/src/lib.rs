use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    plans_completed_total: AtomicU64,
    quick_answers_total: AtomicU64,
    parse_failures_total: AtomicU64,
    synthesis_failures_total: AtomicU64,
    degraded_stages_total: AtomicU64,
    branch_timeouts_total: AtomicU64,
    generation_calls_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub plans_completed_total: u64,
    pub quick_answers_total: u64,
    pub parse_failures_total: u64,
    pub synthesis_failures_total: u64,
    pub degraded_stages_total: u64,
    pub branch_timeouts_total: u64,
    pub generation_calls_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan_completed(&self) {
        self.plans_completed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_quick_answer(&self) {
        self.quick_answers_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parse_failure(&self) {
        self.parse_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_synthesis_failure(&self) {
        self.synthesis_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_degraded_stage(&self) {
        self.degraded_stages_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_branch_timeout(&self) {
        self.branch_timeouts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_call(&self) {
        self.generation_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            plans_completed_total: self.plans_completed_total.load(Ordering::Relaxed),
            quick_answers_total: self.quick_answers_total.load(Ordering::Relaxed),
            parse_failures_total: self.parse_failures_total.load(Ordering::Relaxed),
            synthesis_failures_total: self.synthesis_failures_total.load(Ordering::Relaxed),
            degraded_stages_total: self.degraded_stages_total.load(Ordering::Relaxed),
            branch_timeouts_total: self.branch_timeouts_total.load(Ordering::Relaxed),
            generation_calls_total: self.generation_calls_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wayfarer_api=info,wayfarer_agents=info,wayfarer_llm=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_requests() {
        let metrics = AppMetrics::default();
        metrics.inc_request();
        metrics.inc_request();
        metrics.observe_latency(Duration::from_millis(300));
        metrics.inc_branch_timeout();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.branch_timeouts_total, 1);
        assert_eq!(snapshot.avg_latency_millis, 150.0);
    }
}
