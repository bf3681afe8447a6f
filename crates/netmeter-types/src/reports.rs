//! Report records: the (converter, resource, role) participation rows the
//! broker reads and writes once per tick.
//!
//! A report is not a subtype hierarchy -- brokered vs. unbrokered is a flag
//! on a single record, computed during ledger refresh and consumed during
//! result dispatch. See `netmeter-broker` for who writes which field.

use serde::{Deserialize, Serialize};

use crate::ids::{ConverterId, ResourceId};

/// One producer's declared offer and the broker's most recent decision
/// about how much of it was actually used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProducerReport {
    /// The producing converter.
    pub endpoint_id: ConverterId,
    /// The resource being offered.
    pub resource_id: ResourceId,
    /// Host-declared production rate, in units per second. Must be
    /// non-negative; negative values are a host contract violation.
    pub amount_offered_per_sec: f64,
    /// Broker-written: units actually used this tick.
    pub amount_used_per_tick: f64,
    /// Broker-written: true iff this report was part of a resource network
    /// with at least one matching consumer during the most recent refresh.
    pub is_brokered: bool,
}

impl ProducerReport {
    /// Create a new, not-yet-brokered producer report.
    ///
    /// `amount_used_per_tick` starts at zero and `is_brokered` starts
    /// `false` until the next ledger refresh classifies it.
    #[must_use]
    pub const fn new(
        endpoint_id: ConverterId,
        resource_id: ResourceId,
        amount_offered_per_sec: f64,
    ) -> Self {
        Self {
            endpoint_id,
            resource_id,
            amount_offered_per_sec,
            amount_used_per_tick: 0.0,
            is_brokered: false,
        }
    }
}

/// One consumer's declared request and the broker's most recent decision
/// about how much of it was granted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumerReport {
    /// The consuming converter.
    pub endpoint_id: ConverterId,
    /// The resource being requested.
    pub resource_id: ResourceId,
    /// Host-declared request rate, in units per second. Must be
    /// non-negative; negative values are a host contract violation.
    pub amount_requested_per_sec: f64,
    /// Host-declared: true if this demand may be starved in favor of
    /// required consumers once supply runs short.
    pub is_optional: bool,
    /// Broker-written: units actually granted this tick.
    pub amount_granted_per_tick: f64,
    /// Broker-written: true iff this report was part of a resource network
    /// with at least one matching producer during the most recent refresh.
    pub is_brokered: bool,
}

impl ConsumerReport {
    /// Create a new, not-yet-brokered consumer report.
    #[must_use]
    pub const fn new(
        endpoint_id: ConverterId,
        resource_id: ResourceId,
        amount_requested_per_sec: f64,
        is_optional: bool,
    ) -> Self {
        Self {
            endpoint_id,
            resource_id,
            amount_requested_per_sec,
            is_optional,
            amount_granted_per_tick: 0.0,
            is_brokered: false,
        }
    }
}

/// Per-converter scratch container populated by the host when the broker
/// asks it to (re-)register its reports.
///
/// The two sequences are cleared and refilled in place on every refresh;
/// the registry is never reallocated once its capacity covers the
/// converter's report count.
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    producer_reports: Vec<ProducerReport>,
    consumer_reports: Vec<ConsumerReport>,
}

impl ReportRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            producer_reports: Vec::new(),
            consumer_reports: Vec::new(),
        }
    }

    /// Discard all reports without releasing the backing storage.
    pub fn clear(&mut self) {
        self.producer_reports.clear();
        self.consumer_reports.clear();
    }

    /// Add a producer report to the registry.
    pub fn add_producer(&mut self, report: ProducerReport) {
        self.producer_reports.push(report);
    }

    /// Add a consumer report to the registry.
    pub fn add_consumer(&mut self, report: ConsumerReport) {
        self.consumer_reports.push(report);
    }

    /// Return the currently registered producer reports.
    #[must_use]
    pub fn producer_reports(&self) -> &[ProducerReport] {
        &self.producer_reports
    }

    /// Return the currently registered consumer reports.
    #[must_use]
    pub fn consumer_reports(&self) -> &[ConsumerReport] {
        &self.consumer_reports
    }
}

/// Per-converter, per-tick output: reports partitioned into brokered and
/// unbrokered buckets for producers and consumers.
///
/// One instance is reused per converter across ticks; the converter
/// adapter clears and repopulates it at the end of every
/// `on_broker_result` call.
#[derive(Debug, Clone, Default)]
pub struct ConversionResults {
    brokered_producers: Vec<ProducerReport>,
    unbrokered_producers: Vec<ProducerReport>,
    brokered_consumers: Vec<ConsumerReport>,
    unbrokered_consumers: Vec<ConsumerReport>,
    delta_time: f64,
}

impl ConversionResults {
    /// Create an empty results container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            brokered_producers: Vec::new(),
            unbrokered_producers: Vec::new(),
            brokered_consumers: Vec::new(),
            unbrokered_consumers: Vec::new(),
            delta_time: 0.0,
        }
    }

    /// Discard all partitioned reports without releasing backing storage.
    pub fn clear(&mut self) {
        self.brokered_producers.clear();
        self.unbrokered_producers.clear();
        self.brokered_consumers.clear();
        self.unbrokered_consumers.clear();
        self.delta_time = 0.0;
    }

    /// Set the delta time this result set was produced with.
    pub const fn set_delta_time(&mut self, delta_time: f64) {
        self.delta_time = delta_time;
    }

    /// Partition a producer report into the brokered or unbrokered bucket
    /// according to its `is_brokered` flag.
    pub fn push_producer(&mut self, report: ProducerReport) {
        if report.is_brokered {
            self.brokered_producers.push(report);
        } else {
            self.unbrokered_producers.push(report);
        }
    }

    /// Partition a consumer report into the brokered or unbrokered bucket
    /// according to its `is_brokered` flag.
    pub fn push_consumer(&mut self, report: ConsumerReport) {
        if report.is_brokered {
            self.brokered_consumers.push(report);
        } else {
            self.unbrokered_consumers.push(report);
        }
    }

    /// Producer reports that were part of a brokered network this tick.
    #[must_use]
    pub fn brokered_producers(&self) -> &[ProducerReport] {
        &self.brokered_producers
    }

    /// Producer reports that were isolated (no matching consumer) this tick.
    #[must_use]
    pub fn unbrokered_producers(&self) -> &[ProducerReport] {
        &self.unbrokered_producers
    }

    /// Consumer reports that were part of a brokered network this tick.
    #[must_use]
    pub fn brokered_consumers(&self) -> &[ConsumerReport] {
        &self.brokered_consumers
    }

    /// Consumer reports that were isolated (no matching producer) this tick.
    #[must_use]
    pub fn unbrokered_consumers(&self) -> &[ConsumerReport] {
        &self.unbrokered_consumers
    }

    /// The delta time these results were computed with.
    #[must_use]
    pub const fn delta_time(&self) -> f64 {
        self.delta_time
    }
}
