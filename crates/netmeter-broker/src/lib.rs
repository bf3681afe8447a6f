//! Per-tick ledger and proportional allocation engine for a net-metered
//! resource flow broker.
//!
//! A [`Broker`] tracks producer and consumer reports for a population of
//! converters, indexed by resource, and on each tick either rebuilds that
//! index (if a converter was registered or unregistered since the last
//! tick) or reuses it, then runs the proportional-sharing allocation
//! formulas for every resource and pushes the outcome back to each
//! converter through its [`ConverterHandle`].
//!
//! This crate has no notion of a host, a simulation clock, or a converter's
//! domain behavior -- those live in `netmeter-adapter` and whatever embeds
//! it. It only knows how to keep the ledger consistent and how to split a
//! resource's supply across its consumers.
//!
//! # Modules
//!
//! - [`handle`] -- [`ConverterHandle`], the broker's callback seam.
//! - [`broker`] -- [`Broker`], the public engine.
//! - `ledger` -- internal canonical storage and per-resource index.
//! - `allocation` -- internal per-resource allocation formulas.

mod allocation;
mod ledger;

pub mod broker;
pub mod handle;

pub use broker::Broker;
pub use handle::ConverterHandle;
