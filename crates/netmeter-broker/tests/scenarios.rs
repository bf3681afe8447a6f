//! Literal-input scenarios exercising the allocation rule end to end
//! through the public `Broker` API.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::cell::RefCell;
use std::rc::Rc;

use netmeter_broker::{Broker, ConverterHandle};
use netmeter_types::{ConsumerReport, ConverterId, ProducerReport, ResourceId};

/// A converter stand-in whose reports are set directly by the test and
/// whose last dispatched result is captured for assertions.
struct StubConverter {
    id: ConverterId,
    producers: Vec<ProducerReport>,
    consumers: Vec<ConsumerReport>,
    last_producers: Vec<ProducerReport>,
    last_consumers: Vec<ConsumerReport>,
}

impl StubConverter {
    fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            id: ConverterId::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
            last_producers: Vec::new(),
            last_consumers: Vec::new(),
        }))
    }
}

impl ConverterHandle for StubConverter {
    fn converter_id(&self) -> ConverterId {
        self.id
    }

    fn register_reports(
        &mut self,
        producers: &mut Vec<ProducerReport>,
        consumers: &mut Vec<ConsumerReport>,
    ) {
        producers.extend(self.producers.iter().copied());
        consumers.extend(self.consumers.iter().copied());
    }

    fn on_broker_result(
        &mut self,
        _delta_time: f64,
        producers: &[ProducerReport],
        consumers: &[ConsumerReport],
    ) {
        self.last_producers = producers.to_vec();
        self.last_consumers = consumers.to_vec();
    }
}

fn as_handle(stub: &Rc<RefCell<StubConverter>>) -> Rc<RefCell<dyn ConverterHandle>> {
    stub.clone()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn s1_balanced_pair() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 10.0));
    broker.register_converter(&as_handle(&producer));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r1, 5.0, false));
    broker.register_converter(&as_handle(&consumer));

    broker.run_converters(1.0);

    let c = &consumer.borrow().last_consumers[0];
    assert!(close(c.amount_granted_per_tick, 5.0));
    assert!(c.is_brokered);

    let p = &producer.borrow().last_producers[0];
    assert!(close(p.amount_used_per_tick, 5.0));
    assert!(p.is_brokered);
}

#[test]
fn s2_insufficient_supply_single_required_consumer() {
    let mut broker = Broker::new();
    let r3 = ResourceId::new(3);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r3, 5.0));
    broker.register_converter(&as_handle(&producer));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r3, 10.0, false));
    broker.register_converter(&as_handle(&consumer));

    broker.run_converters(1.0);

    assert!(close(consumer.borrow().last_consumers[0].amount_granted_per_tick, 5.0));
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 5.0));
    assert!(consumer.borrow().last_consumers[0].is_brokered);
    assert!(producer.borrow().last_producers[0].is_brokered);
}

#[test]
fn s3_two_required_consumers_share_scarcity() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 10.0));
    broker.register_converter(&as_handle(&producer));

    let a = StubConverter::new();
    a.borrow_mut().consumers.push(ConsumerReport::new(a.borrow().id, r1, 10.0, false));
    broker.register_converter(&as_handle(&a));

    let b = StubConverter::new();
    b.borrow_mut().consumers.push(ConsumerReport::new(b.borrow().id, r1, 10.0, false));
    broker.register_converter(&as_handle(&b));

    broker.run_converters(1.0);

    assert!(close(a.borrow().last_consumers[0].amount_granted_per_tick, 5.0));
    assert!(close(b.borrow().last_consumers[0].amount_granted_per_tick, 5.0));
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 10.0));
}

#[test]
fn s4_required_beats_optional() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 10.0));
    broker.register_converter(&as_handle(&producer));

    let required = StubConverter::new();
    required.borrow_mut().consumers.push(ConsumerReport::new(required.borrow().id, r1, 10.0, false));
    broker.register_converter(&as_handle(&required));

    let optional = StubConverter::new();
    optional.borrow_mut().consumers.push(ConsumerReport::new(optional.borrow().id, r1, 10.0, true));
    broker.register_converter(&as_handle(&optional));

    broker.run_converters(1.0);

    assert!(close(required.borrow().last_consumers[0].amount_granted_per_tick, 10.0));
    assert!(close(optional.borrow().last_consumers[0].amount_granted_per_tick, 0.0));
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 10.0));
}

#[test]
fn s5_surplus_split_across_optionals() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 12.0));
    broker.register_converter(&as_handle(&producer));

    let required = StubConverter::new();
    required.borrow_mut().consumers.push(ConsumerReport::new(required.borrow().id, r1, 10.0, false));
    broker.register_converter(&as_handle(&required));

    let optional = StubConverter::new();
    optional.borrow_mut().consumers.push(ConsumerReport::new(optional.borrow().id, r1, 10.0, true));
    broker.register_converter(&as_handle(&optional));

    broker.run_converters(1.0);

    assert!(close(required.borrow().last_consumers[0].amount_granted_per_tick, 10.0));
    assert!(close(optional.borrow().last_consumers[0].amount_granted_per_tick, 2.0));
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 12.0));
}

#[test]
fn s6_two_producers_share_load() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer_a = StubConverter::new();
    producer_a.borrow_mut().producers.push(ProducerReport::new(producer_a.borrow().id, r1, 6.0));
    broker.register_converter(&as_handle(&producer_a));

    let producer_b = StubConverter::new();
    producer_b.borrow_mut().producers.push(ProducerReport::new(producer_b.borrow().id, r1, 4.0));
    broker.register_converter(&as_handle(&producer_b));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r1, 8.0, false));
    broker.register_converter(&as_handle(&consumer));

    broker.run_converters(1.0);

    assert!(close(consumer.borrow().last_consumers[0].amount_granted_per_tick, 8.0));
    assert!(close(producer_a.borrow().last_producers[0].amount_used_per_tick, 4.8));
    assert!(close(producer_b.borrow().last_producers[0].amount_used_per_tick, 3.2));
}

#[test]
fn s7_isolated_resource_culled() {
    let mut broker = Broker::new();
    let r100 = ResourceId::new(100);
    let r101 = ResourceId::new(101);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r100, 10.0));
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r101, 5.0));
    broker.register_converter(&as_handle(&producer));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r100, 6.0, false));
    broker.register_converter(&as_handle(&consumer));

    broker.run_converters(1.0);

    let producer_ref = producer.borrow();
    let brokered = producer_ref
        .last_producers
        .iter()
        .find(|r| r.resource_id == r100)
        .expect("r100 report present");
    let unbrokered = producer_ref
        .last_producers
        .iter()
        .find(|r| r.resource_id == r101)
        .expect("r101 report present");

    assert!(brokered.is_brokered);
    assert!(close(brokered.amount_used_per_tick, 6.0));
    assert!(!unbrokered.is_brokered);
    assert!(close(unbrokered.amount_used_per_tick, 0.0));

    assert!(consumer.borrow().last_consumers[0].is_brokered);
    assert!(close(consumer.borrow().last_consumers[0].amount_granted_per_tick, 6.0));
}

#[test]
fn s8_refresh_on_resource_change() {
    let mut broker = Broker::new();
    let r8 = ResourceId::new(8);
    let r9 = ResourceId::new(9);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r8, 8.0));
    broker.register_converter(&as_handle(&producer));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r8, 8.0, false));
    let consumer_handle = as_handle(&consumer);
    broker.register_converter(&consumer_handle);

    broker.run_converters(1.0);
    assert!(producer.borrow().last_producers[0].is_brokered);
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 8.0));
    assert!(consumer.borrow().last_consumers[0].is_brokered);

    consumer.borrow_mut().consumers.clear();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r9, 8.0, false));
    broker.set_needs_refresh(true);

    broker.run_converters(1.0);

    assert!(!producer.borrow().last_producers[0].is_brokered);
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 0.0));
    assert!(!consumer.borrow().last_consumers[0].is_brokered);
    assert!(close(consumer.borrow().last_consumers[0].amount_granted_per_tick, 0.0));
}

#[test]
fn s9_multi_role_converter_isolation_then_brokered() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let solo = StubConverter::new();
    solo.borrow_mut().producers.push(ProducerReport::new(solo.borrow().id, r1, 10.0));
    solo.borrow_mut().consumers.push(ConsumerReport::new(solo.borrow().id, r1, 4.0, false));
    broker.register_converter(&as_handle(&solo));

    broker.run_converters(1.0);
    assert!(!solo.borrow().last_producers[0].is_brokered);
    assert!(!solo.borrow().last_consumers[0].is_brokered);

    let other = StubConverter::new();
    other.borrow_mut().consumers.push(ConsumerReport::new(other.borrow().id, r1, 2.0, false));
    broker.register_converter(&as_handle(&other));

    broker.run_converters(1.0);

    assert!(solo.borrow().last_producers[0].is_brokered);
    assert!(solo.borrow().last_consumers[0].is_brokered);
    assert!(other.borrow().last_consumers[0].is_brokered);
}

#[test]
fn zero_delta_time_preserves_brokered_flags_with_no_transfer() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 10.0));
    broker.register_converter(&as_handle(&producer));

    let consumer = StubConverter::new();
    consumer.borrow_mut().consumers.push(ConsumerReport::new(consumer.borrow().id, r1, 5.0, false));
    broker.register_converter(&as_handle(&consumer));

    broker.run_converters(0.0);

    assert!(producer.borrow().last_producers[0].is_brokered);
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 0.0));
    assert!(consumer.borrow().last_consumers[0].is_brokered);
    assert!(close(consumer.borrow().last_consumers[0].amount_granted_per_tick, 0.0));
}

#[test]
fn optional_only_demand_shares_full_supply_without_division_by_zero() {
    let mut broker = Broker::new();
    let r1 = ResourceId::new(1);

    let producer = StubConverter::new();
    producer.borrow_mut().producers.push(ProducerReport::new(producer.borrow().id, r1, 10.0));
    broker.register_converter(&as_handle(&producer));

    let optional = StubConverter::new();
    optional.borrow_mut().consumers.push(ConsumerReport::new(optional.borrow().id, r1, 10.0, true));
    broker.register_converter(&as_handle(&optional));

    broker.run_converters(1.0);

    assert!(close(optional.borrow().last_consumers[0].amount_granted_per_tick, 10.0));
    assert!(close(producer.borrow().last_producers[0].amount_used_per_tick, 10.0));
}
