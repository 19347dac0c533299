//! Document graph model and the collaborators that reshape it.
//!
//! - [`model`]: typed entity arrays with pending in-memory payloads
//! - [`pool`]: the buffer-pool append primitive
//! - [`passes`]: unreachable-element pruning and buffer merging
//! - [`load`]: decoding data URIs and reading relative files into pending payloads

pub mod load;
pub mod model;
pub mod passes;
pub mod pool;
