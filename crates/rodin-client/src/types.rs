use std::fmt;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use url::Url;

use crate::error::{Result, RodinError};

/// Name of the preview render Rodin includes with finished tasks
pub const PREVIEW_ASSET: &str = "preview.webp";

/// A generation job submission
///
/// Either a prompt or at least one image should be given; the vendor
/// rejects requests with neither.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Text prompt; has little effect when images are given
    pub prompt: Option<String>,
    /// Reference images, uploaded in order
    pub images: Vec<ReferenceImage>,
    pub options: GenerationOptions,
}

/// Reference image uploaded as an `images` multipart part
#[derive(Clone)]
pub struct ReferenceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ReferenceImage {
    /// Read an image from disk, guessing its content type from the extension
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::InvalidRequest`] if the file cannot be read
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RodinError::InvalidRequest(format!("cannot read image {}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Optional generation settings; `None` leaves the vendor default in place
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GenerationOptions {
    /// How multiple images are combined: `concat` (views of one object) or `fuse`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_mode: Option<ConditionMode>,
    /// Output mesh format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_file_format: Option<GeometryFormat>,
    /// Material type of the generated model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    /// Mesh face-count preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    /// Generation tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Face topology of the output mesh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_mode: Option<MeshMode>,
    /// Seed for reproducible generations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Sharper, more detailed geometry at the cost of generation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_hyper: Option<bool>,
    /// Generate humanoid models in T/A pose
    #[serde(default, rename = "TAPose", skip_serializing_if = "Option::is_none")]
    pub ta_pose: Option<bool>,
}

impl GenerationOptions {
    /// Multipart text fields for every option that is set
    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();

        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                fields.push((name, value));
            }
        };

        push("condition_mode", self.condition_mode.map(|v| v.as_ref().to_string()));
        push("geometry_file_format", self.geometry_file_format.map(|v| v.as_ref().to_string()));
        push("material", self.material.map(|v| v.as_ref().to_string()));
        push("quality", self.quality.map(|v| v.as_ref().to_string()));
        push("tier", self.tier.map(|v| v.as_ref().to_string()));
        push("mesh_mode", self.mesh_mode.map(|v| v.as_ref().to_string()));
        push("seed", self.seed.map(|v| v.to_string()));
        push("use_hyper", self.use_hyper.map(|v| v.to_string()));
        push("TAPose", self.ta_pose.map(|v| v.to_string()));

        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConditionMode {
    Concat,
    Fuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeometryFormat {
    Glb,
    Usdz,
    Fbx,
    Obj,
    Stl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
pub enum Material {
    #[serde(rename = "PBR")]
    #[strum(serialize = "PBR")]
    Pbr,
    Shaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Quality {
    High,
    Medium,
    Low,
    ExtraLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
pub enum Tier {
    Regular,
    Sketch,
    Detail,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema, AsRefStr)]
pub enum MeshMode {
    Quad,
    Raw,
}

/// Body of a successful submission, returned to the caller unmodified
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    Json(serde_json::Value),
    /// The vendor answered with a body that is not JSON
    Text(String),
}

impl SubmitResponse {
    /// Typed view of the job descriptor
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::MalformedResponse`] if the body lacks the task
    /// uuid or subscription key
    pub fn descriptor(&self) -> Result<JobDescriptor> {
        match self {
            Self::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| RodinError::MalformedResponse(format!("job descriptor: {e}"))),
            Self::Text(text) => Err(RodinError::MalformedResponse(format!("job descriptor is not JSON: {text}"))),
        }
    }
}

/// Task handle returned by a submission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobDescriptor {
    /// Task uuid, needed to request the download manifest
    pub uuid: String,
    pub jobs: JobSet,
    /// Prompt as refined by the vendor
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub submit_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobSet {
    pub uuids: Vec<String>,
    /// Credential scoping status queries to this task
    pub subscription_key: String,
}

/// Status of one job of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
    Canceled,
    /// A status string this client does not know; treated as in progress
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Waiting" | "Pending" => Self::Pending,
            "Generating" | "Running" => Self::Running,
            "Done" => Self::Done,
            "Failed" => Self::Failed,
            "Canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this status ends the task without results
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Running => f.write_str("Running"),
            Self::Done => f.write_str("Done"),
            Self::Failed => f.write_str("Failed"),
            Self::Canceled => f.write_str("Canceled"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Wire format of the status endpoint
#[derive(Deserialize)]
pub(crate) struct StatusResponse {
    pub jobs: Vec<StatusEntry>,
}

#[derive(Deserialize)]
pub(crate) struct StatusEntry {
    pub status: String,
}

/// Wire format of the download endpoint
#[derive(Deserialize)]
pub(crate) struct DownloadListResponse {
    pub list: Vec<DownloadListEntry>,
}

#[derive(Deserialize)]
pub(crate) struct DownloadListEntry {
    pub name: String,
    pub url: String,
}

/// Downloadable result assets of a finished task, in vendor order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    assets: IndexMap<String, Url>,
}

impl AssetManifest {
    /// Build a manifest from `(name, url)` pairs
    ///
    /// A repeated name keeps its first position and takes the last URL.
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::MalformedResponse`] if a name is not a plain file
    /// name or a URL does not parse
    pub fn from_entries<I, N, U>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: AsRef<str>,
    {
        let mut assets = IndexMap::new();

        for (name, url) in entries {
            let name = name.into();

            if !is_plain_file_name(&name) {
                return Err(RodinError::MalformedResponse(format!("asset name `{name}` is not a file name")));
            }

            let url = Url::parse(url.as_ref())
                .map_err(|e| RodinError::MalformedResponse(format!("asset `{name}` has an invalid URL: {e}")))?;

            if let Some(previous) = assets.insert(name.clone(), url) {
                tracing::warn!(asset = %name, %previous, "duplicate asset name in manifest, keeping the last URL");
            }
        }

        Ok(Self { assets })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Url> {
        self.assets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.assets.iter().map(|(name, url)| (name.as_str(), url))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Parameters of a result retrieval
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub subscription_key: String,
    pub task_uuid: String,
    /// Directory the assets are written into, created if absent
    pub target_dir: PathBuf,
}

/// Result of a retrieval attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The poll budget ran out before every job was done; call again later
    NotFinished,
    Completed {
        directory: PathBuf,
        /// Written files, in manifest order
        files: Vec<PathBuf>,
        /// Path of `preview.webp` when the task produced one
        preview: Option<PathBuf>,
    },
}
