use base64::Engine as _;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use rodin_client::{
    DownloadOutcome, DownloadRequest, GenerationRequest, ReferenceImage, RodinClient, RodinError, SubmitResponse,
};

use crate::params::{DownloadParameters, GenerateParameters};

/// Returned when the poll budget runs out before the task is done
pub const NOT_FINISHED_MESSAGE: &str = "Task not finished yet. Try again later.";

const INSTRUCTIONS: &str = "Generate 3D models with Rodin. Call generate_3d_model to start a task, \
    then call try_download_result with the returned uuid and jobs.subscription_key until the \
    assets are downloaded. Generation usually takes a minute or more.";

/// MCP server exposing the Rodin tools
#[derive(Clone)]
pub struct RodinServer {
    client: RodinClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RodinServer {
    pub fn new(client: RodinClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Call the Rodin API to generate a mesh and textures from a prompt and/or reference images.

[Notes]
- Keep prompts concise and describe what the model is, not what it is not.
- Ask the user for a reference image. Without one, a prompt is required.
- If images are used, ask the user for their absolute paths and never invent paths. When images are given, omit the prompt.
- Confirm the model format and other notable parameters with the user before generating.

[Returns]
The created task: prompt (as refined by Rodin), submit_time, uuid (the task UUID) and jobs (uuids, subscription_key). Keep uuid and jobs.subscription_key for try_download_result."
    )]
    pub async fn generate_3d_model(
        &self,
        Parameters(params): Parameters<GenerateParameters>,
    ) -> Result<CallToolResult, McpError> {
        let prompt = params.prompt().map(str::to_owned);

        if prompt.is_none() && params.image_paths.is_empty() {
            return Ok(tool_error("either a prompt or at least one image path is required"));
        }

        let mut images = Vec::with_capacity(params.image_paths.len());
        for path in &params.image_paths {
            match ReferenceImage::from_path(path).await {
                Ok(image) => images.push(image),
                Err(e) => return Ok(rodin_error(&e)),
            }
        }

        let request = GenerationRequest {
            prompt,
            images,
            options: params.options,
        };

        match self.client.submit(request).await {
            Ok(response) => {
                if let Ok(descriptor) = response.descriptor() {
                    tracing::info!(
                        task_uuid = %descriptor.uuid,
                        jobs = descriptor.jobs.uuids.len(),
                        "generation task submitted"
                    );
                }

                Ok(CallToolResult::success(vec![submit_content(response)]))
            }
            Err(e) => Ok(rodin_error(&e)),
        }
    }

    #[tool(
        description = "Try to download the generated assets if Rodin has finished the generation task.

[Notes]
- Always get an absolute directory path from the user before calling this tool.
- target_directory_path is a directory; assets are written to {target_directory_path}/{asset name}. Do not include a file name.
- If the task is not finished yet, wait a little and call this tool again."
    )]
    pub async fn try_download_result(
        &self,
        Parameters(params): Parameters<DownloadParameters>,
    ) -> Result<CallToolResult, McpError> {
        if !params.target_directory_path.is_absolute() {
            return Ok(tool_error(&format!(
                "target_directory_path must be an absolute path, got {}",
                params.target_directory_path.display()
            )));
        }

        let request = DownloadRequest {
            subscription_key: params.subscription_key,
            task_uuid: params.uuid,
            target_dir: params.target_directory_path,
        };

        let outcome = match self.client.try_download_result(&request).await {
            Ok(outcome) => outcome,
            Err(e) => return Ok(rodin_error(&e)),
        };

        match outcome {
            DownloadOutcome::NotFinished => Ok(CallToolResult::success(vec![Content::text(NOT_FINISHED_MESSAGE)])),
            DownloadOutcome::Completed {
                directory,
                files,
                preview,
            } => {
                let mut content = Vec::with_capacity(2);

                let summary = if let Some(preview) = preview {
                    let bytes = match tokio::fs::read(&preview).await {
                        Ok(bytes) => bytes,
                        Err(e) => return Ok(tool_error(&format!("failed to read {}: {e}", preview.display()))),
                    };
                    content.push(Content::image(
                        base64::engine::general_purpose::STANDARD.encode(bytes),
                        "image/webp",
                    ));
                    "The image above is a preview image of the generated model, without texture and material.\n"
                } else {
                    ""
                };

                let names: Vec<_> = files
                    .iter()
                    .filter_map(|file| file.file_name())
                    .map(|name| name.to_string_lossy())
                    .collect();

                content.push(Content::text(format!(
                    "{summary}The assets are downloaded to {}\nFiles: {}",
                    directory.display(),
                    names.join(", ")
                )));

                Ok(CallToolResult::success(content))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for RodinServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }
}

fn submit_content(response: SubmitResponse) -> Content {
    match response {
        SubmitResponse::Json(json) => {
            Content::text(serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
        }
        SubmitResponse::Text(text) => Content::text(text),
    }
}

fn tool_error(message: &str) -> CallToolResult {
    tracing::warn!(error = message, "tool call rejected");
    CallToolResult::error(vec![Content::text(message.to_owned())])
}

/// Report a client error to the host, including the vendor response if any
fn rodin_error(error: &RodinError) -> CallToolResult {
    tracing::error!(%error, "Rodin request failed");

    let mut message = error.to_string();
    if let Some(response) = error.response() {
        message.push_str(&format!("\nstatus: {}\nbody: {}", response.status, response.body));
    }

    CallToolResult::error(vec![Content::text(message)])
}
