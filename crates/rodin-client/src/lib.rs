//! Client for the Rodin generative 3D API
//!
//! [`RodinClient::submit`] starts a generation task and
//! [`RodinClient::try_download_result`] polls it and downloads its assets.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod client;
mod error;
mod retrieve;
mod types;

pub use client::RodinClient;
pub use error::{ApiResponse, Result, RodinError};
pub use types::{
    AssetManifest, ConditionMode, DownloadOutcome, DownloadRequest, GenerationOptions, GenerationRequest,
    GeometryFormat, JobDescriptor, JobSet, JobStatus, Material, MeshMode, PREVIEW_ASSET, Quality,
    ReferenceImage, SubmitResponse, Tier,
};
