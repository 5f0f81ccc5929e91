use crate::ipc::helpers::{load_settings, reader, respond, to_json, writer, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

const SECTIONS: &[&str] = &["alternatives"];

fn check_section(req: &Request) -> Result<(), HandlerErr> {
    match req.params.get("section").and_then(|v| v.as_str()) {
        None | Some("alternatives") => Ok(()),
        Some(other) => Err(HandlerErr::Plain {
            code: "bad_params",
            message: "unknown section".to_string(),
            details: Some(json!({ "section": other, "known": SECTIONS })),
        }),
    }
}

fn setup_get(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, _) = reader(state)?;
    check_section(req)?;
    let settings = load_settings(conn)?;
    Ok(json!({ "alternatives": to_json(&settings)? }))
}

fn setup_update(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    principal.require_admin()?;
    if req.params.get("section").and_then(|v| v.as_str()).is_none() {
        return Err(HandlerErr::bad_params("missing section"));
    }
    check_section(req)?;
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };

    let current = load_settings(conn)?;
    let next = current.apply_patch(patch).map_err(HandlerErr::bad_params)?;
    next.save(conn)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
    info!(user = %principal.user_id, settings = ?next, "alternatives settings updated");
    Ok(json!({ "alternatives": to_json(&next)?, "message": "settings saved" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(req, setup_get(state, req))),
        "setup.update" => Some(respond(req, setup_update(state, req))),
        _ => None,
    }
}
