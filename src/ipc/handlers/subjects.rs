use crate::directory;
use crate::ipc::helpers::{
    param_opt_str, param_str, reader, respond, to_json, writer, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn subjects_list(state: &AppState, _req: &Request) -> HandlerResult {
    let (conn, _) = reader(state)?;
    let subjects = directory::list_subjects(conn)?;
    Ok(json!({ "subjects": to_json(&subjects)? }))
}

fn subjects_create(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let subject = directory::create_subject(
        conn,
        &principal,
        param_str(req, "name")?,
        param_opt_str(req, "code"),
    )?;
    Ok(json!({
        "subjectId": subject.id,
        "subject": to_json(&subject)?,
        "message": format!("subject \"{}\" created", subject.name)
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(respond(req, subjects_list(state, req))),
        "subjects.create" => Some(respond(req, subjects_create(state, req))),
        _ => None,
    }
}
