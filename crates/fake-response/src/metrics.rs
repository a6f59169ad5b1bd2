//! Prometheus metrics for fake responses.
//!
//! Tracks how often interceptors answered with a fake response and how often
//! they let the request through to the real transport.
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Interceptor decisions per client
    pub static ref REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fake_response_requests_total",
        "Total number of outbound requests seen by fake response interceptors",
        &["client", "outcome"]  // outcome: fake|passthrough|no_context
    )
    .unwrap();

    /// Fake responses served per rule
    pub static ref RULE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fake_response_rule_hits_total",
        "Total number of fake responses served, per rule",
        &["client", "rule"]
    )
    .unwrap();
}

/// Decision taken by an interceptor for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A rule matched and a fake response was returned.
    Fake,
    /// No rule matched; the request went to the real transport.
    Passthrough,
    /// No inbound request in scope; the request went to the real transport.
    NoContext,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Fake => "fake",
            Outcome::Passthrough => "passthrough",
            Outcome::NoContext => "no_context",
        }
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_outcome(client: &str, outcome: Outcome) {
    REQUESTS_TOTAL
        .with_label_values(&[client, outcome.as_str()])
        .inc();
}

pub fn record_rule_hit(client: &str, rule: &str) {
    RULE_HITS_TOTAL.with_label_values(&[client, rule]).inc();
}
