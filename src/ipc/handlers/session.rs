use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{Principal, Role};
use crate::session::Session;
use serde_json::json;
use tracing::info;

fn handle_session_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = match req.params.get("userId").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing userId", None),
    };
    if user_id.is_empty() {
        return err(&req.id, "bad_params", "userId must not be empty", None);
    }
    let role = match req.params.get("role").and_then(|v| v.as_str()) {
        Some(raw) => match Role::parse(raw) {
            Some(r) => r,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "role must be one of: admin, teacher, staff",
                    Some(json!({ "role": raw })),
                )
            }
        },
        None => return err(&req.id, "bad_params", "missing role", None),
    };

    let (session, token) = Session::begin(Principal::new(user_id, role));
    info!(user = %session.principal().user_id, role = ?role, "session started");
    let principal = session.principal().clone();
    state.session = Some(session);
    ok(
        &req.id,
        json!({ "principal": principal, "csrfToken": token }),
    )
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.session.as_ref() {
        Some(s) => ok(
            &req.id,
            json!({ "principal": s.principal(), "startedAt": s.started_at() }),
        ),
        None => ok(&req.id, json!({ "principal": null })),
    }
}

fn handle_session_end(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ended = state.session.take().is_some();
    ok(&req.id, json!({ "ended": ended }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.begin" => Some(handle_session_begin(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        "session.end" => Some(handle_session_end(state, req)),
        _ => None,
    }
}
