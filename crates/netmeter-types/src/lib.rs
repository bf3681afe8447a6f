//! Shared data model for the net-metered resource flow broker.
//!
//! This crate defines the records the broker reads and writes once per
//! tick, and nothing else -- no allocation logic, no ledger, no host
//! contract. It exists so `netmeter-broker` and `netmeter-adapter` agree on
//! a single set of record shapes without depending on each other.
//!
//! # Modules
//!
//! - [`ids`] -- [`ResourceId`] and [`ConverterId`] opaque identifiers.
//! - [`reports`] -- [`ProducerReport`], [`ConsumerReport`], [`ReportRegistry`],
//!   and [`ConversionResults`].

pub mod ids;
pub mod reports;

pub use ids::{ConverterId, ResourceId};
pub use reports::{ConsumerReport, ConversionResults, ProducerReport, ReportRegistry};
