//! Prometheus metrics for the transfer client
//!
//! Counters are registered on the default registry; embedders expose them
//! however they serve metrics (TextEncoder-compatible).

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    pub static ref TRANSFERS_INITIATED: Counter = register_counter!(
        "hookbridge_transfers_initiated_total",
        "Total number of transfers initiated"
    )
    .unwrap();

    pub static ref BURNS_SUBMITTED: CounterVec = register_counter_vec!(
        "hookbridge_burns_submitted_total",
        "Total number of burn transactions submitted",
        &["status"]
    )
    .unwrap();

    pub static ref ANNOUNCEMENTS_PUBLISHED: CounterVec = register_counter_vec!(
        "hookbridge_announcements_published_total",
        "Total number of transfer announcements published",
        &["status"]
    )
    .unwrap();

    pub static ref ATTESTATION_POLLS: Counter = register_counter!(
        "hookbridge_attestation_polls_total",
        "Total number of attestation service polls"
    )
    .unwrap();

    pub static ref STATUS_TRANSITIONS: CounterVec = register_counter_vec!(
        "hookbridge_status_transitions_total",
        "Total number of accepted transfer status transitions",
        &["status"]
    )
    .unwrap();

    pub static ref TRACKER_ERRORS: CounterVec = register_counter_vec!(
        "hookbridge_tracker_errors_total",
        "Total number of swallowed transient tracker errors",
        &["source"]
    )
    .unwrap();
}

pub fn record_transfer_initiated() {
    TRANSFERS_INITIATED.inc();
}

pub fn record_burn_submitted(success: bool) {
    let status = if success { "success" } else { "failure" };
    BURNS_SUBMITTED.with_label_values(&[status]).inc();
}

pub fn record_announcement(success: bool) {
    let status = if success { "success" } else { "failure" };
    ANNOUNCEMENTS_PUBLISHED.with_label_values(&[status]).inc();
}

pub fn record_attestation_poll() {
    ATTESTATION_POLLS.inc();
}

pub fn record_status_transition(status: &str) {
    STATUS_TRANSITIONS.with_label_values(&[status]).inc();
}

pub fn record_tracker_error(source: &str) {
    TRACKER_ERRORS.with_label_values(&[source]).inc();
}
