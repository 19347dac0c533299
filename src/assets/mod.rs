//! Image handling: format sniffing, codec capability, temp workspaces, and the per-image
//! transcode pipeline.

pub mod codec;
pub mod format;
pub mod transcode;
pub mod workspace;
