//! [`ConverterAdapter`]: the deterministic glue between a converter's own
//! host and the broker.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use netmeter_broker::{Broker, ConverterHandle};
use netmeter_types::{ConsumerReport, ConverterId, ConversionResults, ProducerReport, ReportRegistry};
use tracing::trace;

use crate::host::HostContext;

/// Owns a converter's identity and a non-owning reference to both its host
/// and the broker it is registered with.
///
/// `ConverterAdapter` does not store broker-side totals or ledger state;
/// its results are derived entirely from the report records the broker
/// hands back to it each tick.
pub struct ConverterAdapter {
    id: ConverterId,
    host: Weak<RefCell<dyn HostContext>>,
    broker: Weak<RefCell<Broker>>,
    registry: ReportRegistry,
    results: ConversionResults,
}

impl ConverterAdapter {
    /// Create a new adapter for a freshly assigned converter identity,
    /// storing only non-owning references to its host and broker.
    #[must_use]
    pub fn new(broker: &Rc<RefCell<Broker>>, host: &Rc<RefCell<dyn HostContext>>) -> Self {
        Self {
            id: ConverterId::new(),
            host: Rc::downgrade(host),
            broker: Rc::downgrade(broker),
            registry: ReportRegistry::new(),
            results: ConversionResults::new(),
        }
    }

    /// This adapter's converter identity.
    #[must_use]
    pub const fn converter_id(&self) -> ConverterId {
        self.id
    }

    /// Request (or cancel a request for) a ledger rebuild on the broker's
    /// next tick. A no-op if the broker has already been dropped.
    pub fn set_needs_refresh(&self, value: bool) {
        let Some(broker) = self.broker.upgrade() else {
            return;
        };
        broker.borrow_mut().set_needs_refresh(value);
    }

    /// The most recent tick's partitioned results, if any have been
    /// dispatched yet.
    #[must_use]
    pub const fn results(&self) -> &ConversionResults {
        &self.results
    }
}

impl ConverterHandle for ConverterAdapter {
    fn converter_id(&self) -> ConverterId {
        self.id
    }

    fn register_reports(
        &mut self,
        out_producers: &mut Vec<ProducerReport>,
        out_consumers: &mut Vec<ConsumerReport>,
    ) {
        self.registry.clear();
        if let Some(host) = self.host.upgrade() {
            host.borrow_mut().register_reports(&mut self.registry);
        } else {
            trace!(converter = %self.id, "host reference dead during register_reports");
        }

        for report in self.registry.producer_reports() {
            let mut report = *report;
            report.endpoint_id = self.id;
            out_producers.push(report);
        }
        for report in self.registry.consumer_reports() {
            let mut report = *report;
            report.endpoint_id = self.id;
            out_consumers.push(report);
        }
    }

    fn on_broker_result(
        &mut self,
        delta_time: f64,
        producers: &[ProducerReport],
        consumers: &[ConsumerReport],
    ) {
        self.results.clear();
        self.results.set_delta_time(delta_time);
        for report in producers {
            self.results.push_producer(*report);
        }
        for report in consumers {
            self.results.push_consumer(*report);
        }

        if let Some(host) = self.host.upgrade() {
            host.borrow_mut().on_conversion_result(&self.results);
        } else {
            trace!(converter = %self.id, "host reference dead during on_broker_result");
        }
    }
}
