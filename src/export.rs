// Author: Dustin Pilgrim
// License: MIT

use serde_json::json;

use crate::ast::{Body, BodyItem};
use crate::job::Job;
use crate::JobspecError;

/// Export a decoded job to pretty-printed JSON.
///
/// Absent optional fields and empty collections are omitted, so the output
/// only carries what the document set.
///
/// # Examples
/// ```
/// let job = jobspec::parse("input.hcl", "job \"web\" {\n  region = \"eu\"\n}\n")?;
/// let json = jobspec::export::job_to_json(&job)?;
/// assert!(json.contains("\"region\": \"eu\""));
/// # Ok::<(), jobspec::JobspecError>(())
/// ```
pub fn job_to_json(job: &Job) -> Result<String, JobspecError> {
    serde_json::to_string_pretty(job).map_err(|e| JobspecError::Export {
        message: format!("Failed to serialize job: {}", e),
    })
}

/// Export an unevaluated body tree to JSON, mainly for inspecting what
/// dynamic expansion produced.
///
/// Blocks become `{"block": type, "labels": [...], "body": [...]}` entries
/// and attributes `{"attribute": name, "expr": source}`, keeping source order
/// and expressions in their written form.
pub fn body_to_json(body: &Body) -> Result<String, JobspecError> {
    fn items_to_json(body: &Body) -> serde_json::Value {
        let items = body
            .items
            .iter()
            .map(|item| match item {
                BodyItem::Attribute(attr) => json!({
                    "attribute": attr.name,
                    "expr": attr.expr.to_string(),
                }),
                BodyItem::Block(block) => json!({
                    "block": block.block_type,
                    "labels": block.labels,
                    "body": items_to_json(&block.body),
                }),
            })
            .collect();
        serde_json::Value::Array(items)
    }

    serde_json::to_string_pretty(&items_to_json(body)).map_err(|e| JobspecError::Export {
        message: format!("Failed to serialize body: {}", e),
    })
}
