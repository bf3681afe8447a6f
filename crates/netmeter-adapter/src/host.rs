//! The contract a host (game, simulation, or test) must satisfy for each
//! converter it owns.

use netmeter_types::{ConversionResults, ReportRegistry};

/// Operations the broker's converter adapter calls on the host side.
///
/// Implemented by the game or by test scaffolding; never by this crate.
/// `register_reports` is called at most once per ledger refresh;
/// `on_conversion_result` is called exactly once per tick, whether or not
/// a refresh happened.
pub trait HostContext {
    /// Fully describe this converter's current resource behavior for the
    /// upcoming refresh window by pushing producer/consumer reports into
    /// `registry`. The registry has already been cleared by the adapter.
    fn register_reports(&mut self, registry: &mut ReportRegistry);

    /// Apply the broker's decision for this tick (update tanks, generator
    /// state, and so on).
    fn on_conversion_result(&mut self, results: &ConversionResults);
}
