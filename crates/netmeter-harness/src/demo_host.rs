//! A synthetic [`HostContext`] used by the demo binary and by tests that
//! want to exercise the broker without a real game behind it.
//!
//! Each `DemoHost` plays exactly one role (producer, required consumer, or
//! optional consumer) of one resource at a fixed declared rate. Real hosts
//! will typically have converters that mix roles; the demo harness keeps
//! each host single-role so its population is easy to reason about in
//! aggregate.

use netmeter_adapter::HostContext;
use netmeter_types::{ConsumerReport, ConverterId, ConversionResults, ProducerReport, ReportRegistry, ResourceId};

/// The fixed behavior a [`DemoHost`] declares to the broker every refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemoRole {
    /// Offers `rate` units/sec of `resource`.
    Producer { resource: ResourceId, rate: f64 },
    /// Requests `rate` units/sec of `resource`.
    Consumer {
        resource: ResourceId,
        rate: f64,
        optional: bool,
    },
}

/// A minimal host: declares a fixed rate every refresh and records the
/// amount the broker actually moved on its behalf each tick.
#[derive(Debug, Clone)]
pub struct DemoHost {
    role: DemoRole,
    last_amount: f64,
    last_brokered: bool,
}

impl DemoHost {
    /// Create a host playing the given role.
    #[must_use]
    pub const fn new(role: DemoRole) -> Self {
        Self {
            role,
            last_amount: 0.0,
            last_brokered: false,
        }
    }

    /// The role this host declares every refresh.
    #[must_use]
    pub const fn role(&self) -> DemoRole {
        self.role
    }

    /// The amount used (for a producer) or granted (for a consumer) on the
    /// most recent tick.
    #[must_use]
    pub const fn last_amount(&self) -> f64 {
        self.last_amount
    }

    /// Whether this host's report was part of a brokered network on the
    /// most recent tick.
    #[must_use]
    pub const fn last_brokered(&self) -> bool {
        self.last_brokered
    }
}

impl HostContext for DemoHost {
    fn register_reports(&mut self, registry: &mut ReportRegistry) {
        // `endpoint_id` is a placeholder here; the adapter overwrites it
        // with the converter's real identity before handing the report to
        // the broker.
        match self.role {
            DemoRole::Producer { resource, rate } => {
                registry.add_producer(ProducerReport::new(ConverterId::new(), resource, rate));
            }
            DemoRole::Consumer { resource, rate, optional } => {
                registry.add_consumer(ConsumerReport::new(ConverterId::new(), resource, rate, optional));
            }
        }
    }

    fn on_conversion_result(&mut self, results: &ConversionResults) {
        match self.role {
            DemoRole::Producer { .. } => {
                self.last_amount = sum_producer_usage(results);
                self.last_brokered = !results.brokered_producers().is_empty();
            }
            DemoRole::Consumer { .. } => {
                self.last_amount = sum_consumer_grants(results);
                self.last_brokered = !results.brokered_consumers().is_empty();
            }
        }
    }
}

fn sum_producer_usage(results: &ConversionResults) -> f64 {
    results
        .brokered_producers()
        .iter()
        .chain(results.unbrokered_producers())
        .map(|r: &ProducerReport| r.amount_used_per_tick)
        .sum()
}

fn sum_consumer_grants(results: &ConversionResults) -> f64 {
    results
        .brokered_consumers()
        .iter()
        .chain(results.unbrokered_consumers())
        .map(|r: &ConsumerReport| r.amount_granted_per_tick)
        .sum()
}
