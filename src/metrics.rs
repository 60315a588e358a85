// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Prometheus metrics for the social engine.
pub struct Metrics {
    pub registry: Registry,
    /// Notifications written, labelled by kind.
    pub notifications_emitted: IntCounterVec,
    /// Notifications suppressed because actor == recipient.
    pub notifications_suppressed: IntCounterVec,
    /// Fan-out write failures (swallowed, never surfaced to callers).
    pub notifications_failed: IntCounter,
    /// Posts hidden from a listing by the visibility filter.
    pub posts_filtered: IntCounter,
    /// Follow-status lookups that failed and were treated as not-following.
    pub visibility_lookup_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let notifications_emitted = IntCounterVec::new(
            Opts::new(
                "social_notifications_emitted_total",
                "Notifications written, by kind",
            ),
            &["kind"],
        )?;
        let notifications_suppressed = IntCounterVec::new(
            Opts::new(
                "social_notifications_suppressed_total",
                "Self-notifications suppressed, by kind",
            ),
            &["kind"],
        )?;
        let notifications_failed = IntCounter::new(
            "social_notifications_failed_total",
            "Notification writes that failed and were dropped",
        )?;
        let posts_filtered = IntCounter::new(
            "social_posts_filtered_total",
            "Posts excluded from listings by the visibility filter",
        )?;
        let visibility_lookup_failures = IntCounter::new(
            "social_visibility_lookup_failures_total",
            "Follow-status lookups that failed closed",
        )?;

        registry.register(Box::new(notifications_emitted.clone()))?;
        registry.register(Box::new(notifications_suppressed.clone()))?;
        registry.register(Box::new(notifications_failed.clone()))?;
        registry.register(Box::new(posts_filtered.clone()))?;
        registry.register(Box::new(visibility_lookup_failures.clone()))?;

        Ok(Self {
            registry,
            notifications_emitted,
            notifications_suppressed,
            notifications_failed,
            posts_filtered,
            visibility_lookup_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_count() {
        let metrics = Metrics::new().unwrap();
        metrics.notifications_emitted.with_label_values(&["like"]).inc();
        metrics.notifications_emitted.with_label_values(&["like"]).inc();
        metrics.notifications_failed.inc();
        assert_eq!(
            metrics
                .notifications_emitted
                .with_label_values(&["like"])
                .get(),
            2
        );
        assert_eq!(metrics.notifications_failed.get(), 1);
        assert!(!metrics.registry.gather().is_empty());
    }
}
