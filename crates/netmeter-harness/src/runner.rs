//! Bounded tick driver: builds a synthetic population from a
//! [`HarnessConfig`] and runs it through the broker for a fixed number of
//! ticks.

use std::cell::RefCell;
use std::rc::Rc;

use netmeter_adapter::{ConverterAdapter, HostContext};
use netmeter_broker::{Broker, ConverterHandle};
use netmeter_types::ResourceId;
use tracing::info;

use crate::config::HarnessConfig;
use crate::demo_host::{DemoHost, DemoRole};

/// Called after every tick of [`run_demo`]. The default no-op callback is
/// used by the binary; tests and benchmarks can observe intermediate
/// broker state by providing their own.
pub trait DemoObserver {
    /// Invoked once per tick, after `run_converters` returns.
    fn on_tick(&mut self, tick: u64, broker: &Broker);
}

/// A callback that does nothing, for runs that only care about the final
/// [`DemoReport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl DemoObserver for NoOpObserver {
    fn on_tick(&mut self, _tick: u64, _broker: &Broker) {}
}

/// Per-resource snapshot taken after the final tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSummary {
    /// The resource this summary describes.
    pub resource: ResourceId,
    /// Total supply summed on the final tick.
    pub total_produced: f64,
    /// Total required demand summed on the final tick.
    pub total_required: f64,
    /// Total optional demand summed on the final tick.
    pub total_optional: f64,
    /// Number of distinct converters touching this resource.
    pub endpoint_count: usize,
}

/// Outcome of a bounded demo run.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Number of ticks actually executed.
    pub ticks_run: u64,
    /// Number of converters registered with the broker.
    pub converter_count: usize,
    /// Per-resource totals as of the final tick.
    pub resources: Vec<ResourceSummary>,
}

/// A synthetic converter population registered with a broker.
///
/// Keeps the adapters and hosts alive for as long as the population lives;
/// the broker only holds weak references to them. Exposed so benchmarks
/// can build a population once and reuse its broker across many measured
/// ticks, rather than rebuilding the population on every iteration.
pub struct Population {
    broker: Rc<RefCell<Broker>>,
    _adapters: Vec<Rc<RefCell<ConverterAdapter>>>,
    _hosts: Vec<Rc<RefCell<DemoHost>>>,
}

impl Population {
    /// The broker this population is registered with.
    #[must_use]
    pub fn broker(&self) -> &Rc<RefCell<Broker>> {
        &self.broker
    }

    /// Number of converters in this population.
    #[must_use]
    pub fn converter_count(&self) -> usize {
        self._adapters.len()
    }
}

/// Build a synthetic population from `config`, registering every converter
/// with a fresh broker.
#[must_use]
pub fn build_demo_population(config: &HarnessConfig) -> Population {
    let broker = Rc::new(RefCell::new(Broker::new()));
    let mut adapters = Vec::new();
    let mut hosts = Vec::new();

    for resource_index in 0..config.resource_count {
        let resource = ResourceId::new(u64::from(resource_index));

        for _ in 0..config.producers_per_resource {
            spawn(&broker, &mut adapters, &mut hosts, DemoRole::Producer { resource, rate: 10.0 });
        }
        for _ in 0..config.required_consumers_per_resource {
            spawn(
                &broker,
                &mut adapters,
                &mut hosts,
                DemoRole::Consumer { resource, rate: 4.0, optional: false },
            );
        }
        for _ in 0..config.optional_consumers_per_resource {
            spawn(
                &broker,
                &mut adapters,
                &mut hosts,
                DemoRole::Consumer { resource, rate: 3.0, optional: true },
            );
        }
    }

    Population { broker, _adapters: adapters, _hosts: hosts }
}

fn spawn(
    broker: &Rc<RefCell<Broker>>,
    adapters: &mut Vec<Rc<RefCell<ConverterAdapter>>>,
    hosts: &mut Vec<Rc<RefCell<DemoHost>>>,
    role: DemoRole,
) {
    let host = Rc::new(RefCell::new(DemoHost::new(role)));
    let host_handle: Rc<RefCell<dyn HostContext>> = host.clone();
    let adapter = Rc::new(RefCell::new(ConverterAdapter::new(broker, &host_handle)));
    let handle: Rc<RefCell<dyn ConverterHandle>> = adapter.clone();
    broker.borrow_mut().register_converter(&handle);

    adapters.push(adapter);
    hosts.push(host);
}

/// Build a synthetic population from `config` and run it for
/// `config.tick_count` ticks, reporting progress through `observer`.
#[must_use]
pub fn run_demo(config: &HarnessConfig, observer: &mut dyn DemoObserver) -> DemoReport {
    let population = build_demo_population(config);

    info!(
        resource_count = config.resource_count,
        tick_count = config.tick_count,
        converters = population.converter_count(),
        "demo harness starting"
    );

    for tick in 0..config.tick_count {
        population.broker().borrow_mut().run_converters(config.delta_time);
        observer.on_tick(tick, &population.broker().borrow());
    }

    let broker = population.broker().borrow();
    let resources = broker
        .known_resource_ids()
        .map(|resource| ResourceSummary {
            resource,
            total_produced: broker.total_produced(resource),
            total_required: broker.total_required(resource),
            total_optional: broker.total_optional(resource),
            endpoint_count: broker.endpoint_count(resource),
        })
        .collect();

    DemoReport {
        ticks_run: config.tick_count,
        converter_count: broker.registered_converter_count(),
        resources,
    }
}
