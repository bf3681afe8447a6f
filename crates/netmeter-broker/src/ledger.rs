//! The broker's internal ledger: canonical report storage, the per-resource
//! index used for allocation, and the totals derived from it each tick.
//!
//! Reports live in exactly one place -- [`ConverterLedger::producers`] /
//! `::consumers`, keyed by [`ConverterId`] -- so allocation never needs to
//! reconcile two copies of the same record. The per-resource indices store
//! `(ConverterId, usize)` pairs into that canonical storage instead of
//! cloning reports, which is what keeps `run_converters` allocation-free in
//! steady state.

use std::collections::{HashMap, HashSet};

use netmeter_types::{ConsumerReport, ConverterId, ProducerReport, ResourceId};

use crate::allocation;

#[derive(Debug, Default)]
struct ConverterLedger {
    producers: Vec<ProducerReport>,
    consumers: Vec<ConsumerReport>,
}

/// Canonical report storage plus the derived per-resource indices and
/// totals. Owned by [`crate::broker::Broker`]; never exposed to hosts
/// directly.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    reports_by_converter: HashMap<ConverterId, ConverterLedger>,
    known_resource_ids: HashSet<ResourceId>,
    endpoints_by_resource: HashMap<ResourceId, HashSet<ConverterId>>,
    producer_index: HashMap<ResourceId, Vec<(ConverterId, usize)>>,
    consumer_index: HashMap<ResourceId, Vec<(ConverterId, usize)>>,
    total_produced: HashMap<ResourceId, f64>,
    total_required: HashMap<ResourceId, f64>,
    total_optional: HashMap<ResourceId, f64>,
    resource_scratch: Vec<ResourceId>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drop every converter's reports and every derived index. Called at
    /// the start of a refresh; the following install calls rebuild
    /// everything from what converters currently report.
    pub(crate) fn clear_all(&mut self) {
        self.reports_by_converter.clear();
        self.known_resource_ids.clear();
        self.endpoints_by_resource.clear();
        self.producer_index.clear();
        self.consumer_index.clear();
    }

    /// Record a converter's current reports, stamping them not-yet-brokered
    /// and indexing them by resource. Used both for the immediate
    /// best-effort install on `register_converter` and for every converter
    /// visited during a full refresh.
    pub(crate) fn install(
        &mut self,
        id: ConverterId,
        producers: &[ProducerReport],
        consumers: &[ConsumerReport],
    ) {
        let mut entry = ConverterLedger {
            producers: Vec::with_capacity(producers.len()),
            consumers: Vec::with_capacity(consumers.len()),
        };

        for (idx, report) in producers.iter().enumerate() {
            let mut report = *report;
            report.is_brokered = false;
            let resource = report.resource_id;
            entry.producers.push(report);
            self.producer_index.entry(resource).or_default().push((id, idx));
            self.endpoints_by_resource.entry(resource).or_default().insert(id);
            self.known_resource_ids.insert(resource);
        }

        for (idx, report) in consumers.iter().enumerate() {
            let mut report = *report;
            report.is_brokered = false;
            let resource = report.resource_id;
            entry.consumers.push(report);
            self.consumer_index.entry(resource).or_default().push((id, idx));
            self.endpoints_by_resource.entry(resource).or_default().insert(id);
            self.known_resource_ids.insert(resource);
        }

        self.reports_by_converter.insert(id, entry);
    }

    /// Remove every trace of a converter: its canonical reports, its
    /// entries in both per-resource indices, and its membership in every
    /// endpoint set.
    pub(crate) fn remove_converter(&mut self, id: ConverterId) {
        self.reports_by_converter.remove(&id);

        for indices in self.producer_index.values_mut() {
            indices.retain(|&(cid, _)| cid != id);
        }
        self.producer_index.retain(|_, indices| !indices.is_empty());

        for indices in self.consumer_index.values_mut() {
            indices.retain(|&(cid, _)| cid != id);
        }
        self.consumer_index.retain(|_, indices| !indices.is_empty());

        for endpoints in self.endpoints_by_resource.values_mut() {
            endpoints.remove(&id);
        }
        self.endpoints_by_resource.retain(|_, endpoints| !endpoints.is_empty());

        self.known_resource_ids = self
            .producer_index
            .keys()
            .chain(self.consumer_index.keys())
            .copied()
            .collect();
    }

    /// Drop any resource with no producer, no consumer, or fewer than two
    /// distinct endpoints -- it has nothing to broker. Every dropped
    /// report's `is_brokered` flag is set false first; every surviving
    /// report's flag is set true.
    pub(crate) fn cull_isolated(&mut self) {
        let resources: Vec<ResourceId> = self.known_resource_ids.iter().copied().collect();

        for resource in resources {
            let producer_count = self.producer_index.get(&resource).map_or(0, Vec::len);
            let consumer_count = self.consumer_index.get(&resource).map_or(0, Vec::len);
            let endpoint_count = self
                .endpoints_by_resource
                .get(&resource)
                .map_or(0, HashSet::len);
            let isolated = producer_count == 0 || consumer_count == 0 || endpoint_count < 2;

            if isolated {
                if let Some(indices) = self.producer_index.remove(&resource) {
                    Self::mark_producers(&mut self.reports_by_converter, &indices, false);
                }
                if let Some(indices) = self.consumer_index.remove(&resource) {
                    Self::mark_consumers(&mut self.reports_by_converter, &indices, false);
                }
                self.endpoints_by_resource.remove(&resource);
                self.known_resource_ids.remove(&resource);
            } else {
                if let Some(indices) = self.producer_index.get(&resource) {
                    Self::mark_producers(&mut self.reports_by_converter, indices, true);
                }
                if let Some(indices) = self.consumer_index.get(&resource) {
                    Self::mark_consumers(&mut self.reports_by_converter, indices, true);
                }
            }
        }
    }

    fn mark_producers(
        reports_by_converter: &mut HashMap<ConverterId, ConverterLedger>,
        indices: &[(ConverterId, usize)],
        brokered: bool,
    ) {
        for &(cid, idx) in indices {
            if let Some(entry) = reports_by_converter.get_mut(&cid) {
                if let Some(report) = entry.producers.get_mut(idx) {
                    report.is_brokered = brokered;
                }
            }
        }
    }

    fn mark_consumers(
        reports_by_converter: &mut HashMap<ConverterId, ConverterLedger>,
        indices: &[(ConverterId, usize)],
        brokered: bool,
    ) {
        for &(cid, idx) in indices {
            if let Some(entry) = reports_by_converter.get_mut(&cid) {
                if let Some(report) = entry.consumers.get_mut(idx) {
                    report.is_brokered = brokered;
                }
            }
        }
    }

    /// Recompute `total_produced`, `total_required`, and `total_optional`
    /// for every resource still present in the indices. Resources that sum
    /// to zero are omitted rather than stored as zero.
    pub(crate) fn build_totals(&mut self, delta_time: f64) {
        self.total_produced.clear();
        self.total_required.clear();
        self.total_optional.clear();

        let reports_by_converter = &self.reports_by_converter;

        for (&resource, indices) in &self.producer_index {
            let sum: f64 = indices
                .iter()
                .filter_map(|&(cid, idx)| {
                    reports_by_converter
                        .get(&cid)
                        .and_then(|entry| entry.producers.get(idx))
                        .map(|report| report.amount_offered_per_sec * delta_time)
                })
                .sum();
            if sum > 0.0 {
                self.total_produced.insert(resource, sum);
            }
        }

        for (&resource, indices) in &self.consumer_index {
            let mut required = 0.0;
            let mut optional = 0.0;
            for &(cid, idx) in indices {
                let Some(report) = reports_by_converter
                    .get(&cid)
                    .and_then(|entry| entry.consumers.get(idx))
                else {
                    continue;
                };
                let amount = report.amount_requested_per_sec * delta_time;
                if report.is_optional {
                    optional += amount;
                } else {
                    required += amount;
                }
            }
            if required > 0.0 {
                self.total_required.insert(resource, required);
            }
            if optional > 0.0 {
                self.total_optional.insert(resource, optional);
            }
        }
    }

    /// Run the proportional allocation formulas for every known resource,
    /// writing `amount_used_per_tick` and `amount_granted_per_tick` back
    /// into the canonical report records.
    pub(crate) fn allocate_all(&mut self, delta_time: f64) {
        let mut resources = std::mem::take(&mut self.resource_scratch);
        resources.clear();
        resources.extend(self.known_resource_ids.iter().copied());

        for &resource in &resources {
            self.allocate_resource(resource, delta_time);
        }

        resources.clear();
        self.resource_scratch = resources;
    }

    fn allocate_resource(&mut self, resource: ResourceId, delta_time: f64) {
        let produced = self.total_produced.get(&resource).copied().unwrap_or(0.0);
        let required = self.total_required.get(&resource).copied().unwrap_or(0.0);
        let optional = self.total_optional.get(&resource).copied().unwrap_or(0.0);

        let satisfaction = allocation::satisfaction_ratio(produced, required);
        let optional_granted_total = allocation::optional_granted_total(produced, required, optional);
        let optional_satisfaction =
            allocation::optional_satisfaction_ratio(optional, optional_granted_total);

        let Self {
            consumer_index,
            producer_index,
            reports_by_converter,
            ..
        } = self;

        if let Some(indices) = consumer_index.get(&resource) {
            for &(cid, idx) in indices {
                if let Some(report) = reports_by_converter
                    .get_mut(&cid)
                    .and_then(|entry| entry.consumers.get_mut(idx))
                {
                    let requested = report.amount_requested_per_sec * delta_time;
                    let ratio = if report.is_optional {
                        optional_satisfaction
                    } else {
                        satisfaction
                    };
                    report.amount_granted_per_tick = requested * ratio;
                }
            }
        }

        let total_used = required.mul_add(satisfaction, optional_granted_total);
        let usage_ratio = allocation::producer_usage_ratio(produced, total_used);

        if let Some(indices) = producer_index.get(&resource) {
            for &(cid, idx) in indices {
                if let Some(report) = reports_by_converter
                    .get_mut(&cid)
                    .and_then(|entry| entry.producers.get_mut(idx))
                {
                    report.amount_used_per_tick = report.amount_offered_per_sec * delta_time * usage_ratio;
                }
            }
        }
    }

    pub(crate) fn reports_for(&self, id: ConverterId) -> (&[ProducerReport], &[ConsumerReport]) {
        self.reports_by_converter
            .get(&id)
            .map_or((&[][..], &[][..]), |entry| {
                (&entry.producers[..], &entry.consumers[..])
            })
    }

    pub(crate) fn known_resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.known_resource_ids.iter().copied()
    }

    pub(crate) fn is_known_resource(&self, resource: ResourceId) -> bool {
        self.known_resource_ids.contains(&resource)
    }

    pub(crate) fn endpoint_count(&self, resource: ResourceId) -> usize {
        self.endpoints_by_resource.get(&resource).map_or(0, HashSet::len)
    }

    pub(crate) fn total_produced(&self, resource: ResourceId) -> f64 {
        self.total_produced.get(&resource).copied().unwrap_or(0.0)
    }

    pub(crate) fn total_required(&self, resource: ResourceId) -> f64 {
        self.total_required.get(&resource).copied().unwrap_or(0.0)
    }

    pub(crate) fn total_optional(&self, resource: ResourceId) -> f64 {
        self.total_optional.get(&resource).copied().unwrap_or(0.0)
    }
}
