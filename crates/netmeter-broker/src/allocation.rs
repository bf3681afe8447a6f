//! Pure per-resource allocation arithmetic.
//!
//! Every function here is a stateless formula over already-summed totals;
//! [`crate::ledger::Ledger`] is the only caller, and it is responsible for
//! writing the results back into the report records.

/// Fraction of required demand that can be served from `produced`.
///
/// A resource with no required demand is trivially fully satisfied.
#[must_use]
pub(crate) fn satisfaction_ratio(produced: f64, required: f64) -> f64 {
    if required <= 0.0 {
        1.0
    } else {
        (produced / required).min(1.0)
    }
}

/// Units left over after required demand is served, capped at what was
/// actually requested by optional consumers.
#[must_use]
pub(crate) fn optional_granted_total(produced: f64, required: f64, optional: f64) -> f64 {
    let surplus = (produced - required).max(0.0);
    optional.min(surplus)
}

/// Fraction of optional demand served from the surplus.
#[must_use]
pub(crate) fn optional_satisfaction_ratio(optional: f64, optional_granted_total: f64) -> f64 {
    if optional > 0.0 {
        optional_granted_total / optional
    } else {
        0.0
    }
}

/// Fraction of a producer's offered amount that was actually drawn on,
/// split evenly across every producer backing the resource.
#[must_use]
pub(crate) fn producer_usage_ratio(produced: f64, total_used: f64) -> f64 {
    if produced > 0.0 {
        total_used / produced
    } else {
        0.0
    }
}
