//! Host-automatable parameters.
//!
//! The audio thread only ever calls [`ParameterTree::snapshot_into`]; all other
//! access happens on host or GUI threads.

/// The suite's parameter ids and ranges.
pub mod layout;
/// GUI-thread change listeners.
pub mod listeners;
/// Preset documents and migration.
pub mod preset;
/// Ranges, skew and display units.
pub mod range;
/// Registry, host surface and snapshots.
pub mod tree;

pub use layout::{build_tree, Param};
pub use listeners::ParameterListeners;
pub use preset::{PresetDocument, Preserved, SCHEMA_VERSION};
pub use range::{ParameterRange, Unit};
pub use tree::{ParamSnapshot, Parameter, ParameterDescriptor, ParameterTree, ParameterTreeBuilder};
