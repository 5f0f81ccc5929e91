use crate::directory;
use crate::ipc::helpers::{
    param_opt_str, param_str, reader, respond, to_json, writer, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn classes_list(state: &AppState, _req: &Request) -> HandlerResult {
    let (conn, _) = reader(state)?;
    let classes = directory::list_classes(conn)?;
    Ok(json!({ "classes": to_json(&classes)? }))
}

fn classes_create(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let name = param_str(req, "name")?;
    let class = directory::create_class(
        conn,
        &principal,
        name,
        param_opt_str(req, "program"),
        param_opt_str(req, "level"),
    )?;
    Ok(json!({
        "classId": class.id,
        "class": to_json(&class)?,
        "message": format!("class \"{}\" created", class.name)
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(respond(req, classes_list(state, req))),
        "classes.create" => Some(respond(req, classes_create(state, req))),
        _ => None,
    }
}
