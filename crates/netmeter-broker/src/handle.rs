//! The broker's view of a registered converter.
//!
//! [`ConverterHandle`] is the seam between the allocation engine and
//! whatever owns the converter's host-facing identity. `netmeter-adapter`
//! provides the only implementation this workspace ships, but the trait is
//! public so an embedder can plug in its own.

use netmeter_types::{ConsumerReport, ConverterId, ProducerReport};

/// A non-owning handle the broker holds per registered converter.
///
/// The broker never stores converter state directly; it calls back through
/// this trait during refresh (to pull fresh reports) and during result
/// dispatch (to push the tick's outcome).
pub trait ConverterHandle {
    /// This converter's stable identity.
    fn converter_id(&self) -> ConverterId;

    /// Called during ledger refresh. Implementations must clear their own
    /// scratch state, ask their host to repopulate it, then copy the
    /// result into `producers` and `consumers`, which the broker has
    /// already cleared.
    fn register_reports(
        &mut self,
        producers: &mut Vec<ProducerReport>,
        consumers: &mut Vec<ConsumerReport>,
    );

    /// Called once per tick after allocation, with this converter's current
    /// reports as written by the broker. `producers` and `consumers` may be
    /// empty if the converter has not registered any reports of that kind.
    fn on_broker_result(
        &mut self,
        delta_time: f64,
        producers: &[ProducerReport],
        consumers: &[ConsumerReport],
    );
}
