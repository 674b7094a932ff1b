use ctor::ctor;
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::build_info::Version;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref BIDS_RECEIVED: IntCounter =
        IntCounter::new("mev_bids_received", "Counter of bids received on mev_sendBid").unwrap();

    pub static ref BIDS_ACCEPTED: IntCounter = IntCounter::new(
        "mev_bids_accepted",
        "Counter of bids forwarded to the backend and taken by it"
    )
    .unwrap();

    pub static ref BIDS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("mev_bids_rejected", "Counter of rejected bids by kind"),
        &["kind"]
    )
    .unwrap();

    pub static ref BID_ISSUES: IntCounter = IntCounter::new(
        "mev_bid_issues",
        "Counter of issues reported through mev_reportIssue"
    )
    .unwrap();

    pub static ref MEV_API_VERSION: IntGaugeVec = IntGaugeVec::new(
        Opts::new("mev_api_version", "Version of the mev api"),
        &["git", "git_ref", "build_time_utc"]
    )
    .unwrap();
}

#[ctor]
fn register_metrics() {
    REGISTRY.register(Box::new(BIDS_RECEIVED.clone())).unwrap();
    REGISTRY.register(Box::new(BIDS_ACCEPTED.clone())).unwrap();
    REGISTRY.register(Box::new(BIDS_REJECTED.clone())).unwrap();
    REGISTRY.register(Box::new(BID_ISSUES.clone())).unwrap();
    REGISTRY.register(Box::new(MEV_API_VERSION.clone())).unwrap();
}

pub fn inc_bids_received() {
    BIDS_RECEIVED.inc();
}

pub fn inc_bids_accepted() {
    BIDS_ACCEPTED.inc();
}

pub fn inc_bids_rejected(kind: &str) {
    BIDS_REJECTED.with_label_values(&[kind]).inc();
}

pub fn inc_bid_issues() {
    BID_ISSUES.inc();
}

pub fn set_version(version: &Version) {
    MEV_API_VERSION
        .with_label_values(&[
            &version.git_commit,
            &version.git_ref,
            &version.build_time_utc,
        ])
        .set(1);
}

/// Text exposition of [REGISTRY].
pub fn gather_metrics() -> eyre::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_bids_are_exported_by_kind() {
        inc_bids_rejected("not_in_turn");
        let text = gather_metrics().unwrap();
        assert!(text.contains("mev_bids_rejected{kind=\"not_in_turn\"}"));
    }
}
