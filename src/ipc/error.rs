use crate::error::EngineError;
use serde_json::json;
use tracing::{error, warn};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({ "id": id, "ok": true, "result": result })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({ "code": code, "message": message.into() });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({ "id": id, "ok": false, "error": error })
}

/// Envelope for a failed registry/engine call.
///
/// Storage and constraint failures are logged here and reach the admin as a
/// generic message.
pub fn engine_err(id: &str, e: &EngineError) -> serde_json::Value {
    match e {
        EngineError::NotFound { entity, id: missing } => err(
            id,
            e.code(),
            e.to_string(),
            Some(json!({ "entity": entity, "id": missing })),
        ),
        EngineError::Constraint(detail) => {
            warn!(request = id, detail = %detail, "constraint violation");
            err(id, e.code(), "the change conflicts with existing data", None)
        }
        EngineError::Storage(source) => {
            error!(request = id, error = %source, "storage failure");
            err(id, e.code(), "the database could not complete the request", None)
        }
        EngineError::Validation(_) | EngineError::Forbidden(_) => {
            err(id, e.code(), e.to_string(), None)
        }
    }
}
