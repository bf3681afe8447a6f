//! The public broker: a registry of converter handles plus the ledger they
//! share.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use netmeter_types::{ConsumerReport, ConverterId, ProducerReport, ResourceId};
use tracing::{debug, trace};

use crate::handle::ConverterHandle;
use crate::ledger::Ledger;

/// A single-threaded, tick-driven broker for a net-metered resource
/// economy.
///
/// The broker holds no strong references to the converters registered with
/// it -- only [`Weak`] handles -- so a converter (and its owning host) may
/// be dropped at any time without the broker's cooperation. A dead handle
/// is simply skipped the next time it would be visited; the broker never
/// proactively reaps them.
///
/// All of `Broker`'s state lives behind a single `&mut self`, consistent
/// with the single-threaded, lock-free scheduling model this crate assumes.
#[derive(Debug, Default)]
pub struct Broker {
    ledger: Ledger,
    converters: HashMap<ConverterId, Weak<RefCell<dyn ConverterHandle>>>,
    needs_refresh: bool,
    producer_scratch: Vec<ProducerReport>,
    consumer_scratch: Vec<ConsumerReport>,
}

impl Broker {
    /// Create an empty broker with no converters registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter. Returns `false` without changing any state if
    /// a converter with the same id is already registered.
    ///
    /// Immediately pulls the converter's current reports into the
    /// per-resource index for visibility, then marks the ledger dirty so
    /// the next [`Broker::run_converters`] performs a full rebuild
    /// (including isolated-resource culling, which this immediate install
    /// does not do).
    pub fn register_converter(&mut self, handle: &Rc<RefCell<dyn ConverterHandle>>) -> bool {
        let id = handle.borrow().converter_id();
        if self.converters.contains_key(&id) {
            return false;
        }

        self.converters.insert(id, Rc::downgrade(handle));

        self.producer_scratch.clear();
        self.consumer_scratch.clear();
        handle
            .borrow_mut()
            .register_reports(&mut self.producer_scratch, &mut self.consumer_scratch);
        self.ledger.install(id, &self.producer_scratch, &self.consumer_scratch);

        self.needs_refresh = true;
        debug!(converter = %id, "converter registered");
        true
    }

    /// Remove a converter and every report it contributed. A no-op if the
    /// id was never registered.
    pub fn unregister_converter(&mut self, id: ConverterId) {
        if self.converters.remove(&id).is_none() {
            return;
        }
        self.ledger.remove_converter(id);
        self.needs_refresh = true;
        debug!(converter = %id, "converter unregistered");
    }

    /// Whether the next [`Broker::run_converters`] call will perform a full
    /// ledger rebuild before allocating.
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Force (or cancel) a rebuild on the next tick. Converters call this
    /// through their adapter when a host-side change invalidates the
    /// broker's current view of their reports.
    pub fn set_needs_refresh(&mut self, value: bool) {
        self.needs_refresh = value;
    }

    /// Re-derive `total_produced`, `total_required`, and `total_optional`
    /// for every known resource from the reports currently on file.
    /// Exposed independently of [`Broker::run_converters`] so it can be
    /// driven and inspected directly in tests.
    pub fn build_totals(&mut self, delta_time: f64) {
        self.ledger.build_totals(delta_time);
    }

    /// Run one broker tick: rebuild the ledger if dirty, recompute totals,
    /// allocate every resource, then dispatch results to every live
    /// converter.
    ///
    /// Allocates only when a rebuild is due; the steady-state path (no
    /// converters registered or unregistered since the last tick) touches
    /// only already-allocated storage.
    pub fn run_converters(&mut self, delta_time: f64) {
        if self.needs_refresh {
            trace!("ledger refresh due, rebuilding before allocation");
            self.refresh();
        }

        self.ledger.build_totals(delta_time);
        self.ledger.allocate_all(delta_time);

        for (&id, weak) in &self.converters {
            let Some(strong) = weak.upgrade() else {
                continue;
            };
            let (producers, consumers) = self.ledger.reports_for(id);
            strong.borrow_mut().on_broker_result(delta_time, producers, consumers);
        }
    }

    fn refresh(&mut self) {
        self.ledger.clear_all();

        for (&id, weak) in &self.converters {
            let Some(strong) = weak.upgrade() else {
                continue;
            };
            self.producer_scratch.clear();
            self.consumer_scratch.clear();
            strong
                .borrow_mut()
                .register_reports(&mut self.producer_scratch, &mut self.consumer_scratch);
            self.ledger.install(id, &self.producer_scratch, &self.consumer_scratch);
        }

        self.ledger.cull_isolated();
        self.needs_refresh = false;
    }

    /// This converter's current producer reports, as last written by the
    /// broker. Empty if the id is not registered.
    #[must_use]
    pub fn producer_reports(&self, converter: ConverterId) -> &[ProducerReport] {
        self.ledger.reports_for(converter).0
    }

    /// This converter's current consumer reports, as last written by the
    /// broker. Empty if the id is not registered.
    #[must_use]
    pub fn consumer_reports(&self, converter: ConverterId) -> &[ConsumerReport] {
        self.ledger.reports_for(converter).1
    }

    /// Every resource the ledger currently tracks (post-culling, once a
    /// refresh has run).
    pub fn known_resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.ledger.known_resource_ids()
    }

    /// Whether a resource is currently part of the brokered ledger.
    #[must_use]
    pub fn is_known_resource(&self, resource: ResourceId) -> bool {
        self.ledger.is_known_resource(resource)
    }

    /// Number of distinct converters touching a resource.
    #[must_use]
    pub fn endpoint_count(&self, resource: ResourceId) -> usize {
        self.ledger.endpoint_count(resource)
    }

    /// Total supply summed for a resource on the last [`Broker::build_totals`]
    /// call. Zero if the resource has no producers or is unknown.
    #[must_use]
    pub fn total_produced(&self, resource: ResourceId) -> f64 {
        self.ledger.total_produced(resource)
    }

    /// Total required demand summed for a resource on the last
    /// [`Broker::build_totals`] call.
    #[must_use]
    pub fn total_required(&self, resource: ResourceId) -> f64 {
        self.ledger.total_required(resource)
    }

    /// Total optional demand summed for a resource on the last
    /// [`Broker::build_totals`] call.
    #[must_use]
    pub fn total_optional(&self, resource: ResourceId) -> f64 {
        self.ledger.total_optional(resource)
    }

    /// Number of converters currently registered, including any whose weak
    /// handle has since died and not yet been visited.
    #[must_use]
    pub fn registered_converter_count(&self) -> usize {
        self.converters.len()
    }
}
