// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning attachment payloads into [`RenderedContent`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::JgrantsError;
use crate::types::RenderedContent;

/// Decodes inline base64 attachment data.
///
/// UTF-8 text without NUL bytes is returned as markdown, anything else as bytes.
pub fn render_inline(data: &str) -> Result<RenderedContent, JgrantsError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| JgrantsError::parse("attachment data is not valid base64", e))?;

    match String::from_utf8(bytes) {
        Ok(text) if !text.contains('\0') => Ok(RenderedContent::Markdown { name: None, text }),
        Ok(text) => Ok(RenderedContent::Binary {
            name: None,
            bytes: text.into_bytes(),
        }),
        Err(e) => Ok(RenderedContent::Binary {
            name: None,
            bytes: e.into_bytes(),
        }),
    }
}

/// Interprets the payload of the intermediary's file-rendering tool.
pub fn from_tool_payload(payload: &Value) -> RenderedContent {
    let name = payload
        .get("filename")
        .or_else(|| payload.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match payload.get("content_markdown").and_then(Value::as_str) {
        Some(text) => RenderedContent::Markdown {
            name,
            text: text.to_string(),
        },
        None => RenderedContent::Unavailable {
            name,
            reason: "file cannot be rendered as markdown".to_string(),
        },
    }
}
