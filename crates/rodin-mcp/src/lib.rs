//! MCP tool server for the Rodin generative 3D API
//!
//! Exposes `generate_3d_model` and `try_download_result` to an agent host
//! over stdio or streamable HTTP.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod params;
mod server;
pub mod transport;

pub use server::{NOT_FINISHED_MESSAGE, RodinServer};
