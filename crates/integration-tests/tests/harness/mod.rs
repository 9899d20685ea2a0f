//! Shared fixtures for the integration tests

#![allow(dead_code)]

pub mod config;
pub mod mock_rodin;
pub mod server;

use rmcp::model::{CallToolResult, RawImageContent};

/// Concatenated text content of a tool result
pub fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.raw.as_text().map(|t| t.text.clone()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Image content blocks of a tool result
pub fn images_of(result: &CallToolResult) -> Vec<RawImageContent> {
    result
        .content
        .iter()
        .filter_map(|c| c.raw.as_image().cloned())
        .collect()
}

pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error == Some(true)
}
