use std::path::PathBuf;

use rodin_client::GenerationOptions;
use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments of the `generate_3d_model` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateParameters {
    /// Concise description of the model. Omit it when images are given; it
    /// adds little on top of them.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Absolute paths of reference images, exactly as given by the user
    #[serde(default)]
    pub image_paths: Vec<PathBuf>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl GenerateParameters {
    /// The prompt, if it has any non-whitespace content
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Arguments of the `try_download_result` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadParameters {
    /// `jobs.subscription_key` from the `generate_3d_model` result
    pub subscription_key: String,
    /// `uuid` (task uuid) from the `generate_3d_model` result
    pub uuid: String,
    /// Absolute path of the directory to download into; it is created if
    /// missing. A directory, not a file name.
    pub target_directory_path: PathBuf,
}
