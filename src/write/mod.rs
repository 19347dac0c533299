//! Resource externalization: options, output sinks, naming, the per-resource strategy, and the
//! write orchestrator.

pub mod naming;
pub mod options;
pub mod orchestrator;
pub mod sinks;
pub mod strategy;
