use crate::ipc::helpers::{
    load_settings, param_i64, param_i64_list, param_opt_i64, param_str, reader, respond, to_json,
    writer, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::registry::{self, GroupInput};
use serde_json::json;

fn group_input(req: &Request) -> Result<GroupInput, HandlerErr> {
    Ok(GroupInput {
        class_id: param_i64(req, "classId")?,
        name: param_str(req, "groupName")?.to_string(),
        subject_ids: param_i64_list(req, "subjectIds")?,
    })
}

fn alternatives_list(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = reader(state)?;
    let class_filter = param_opt_i64(req, "classId")?;
    let groups = registry::list(conn, &principal, class_filter)?;
    Ok(json!({ "groups": to_json(&groups)? }))
}

fn alternatives_get(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = reader(state)?;
    let group = registry::get(conn, &principal, param_i64(req, "groupId")?)?;
    Ok(json!({ "group": to_json(&group)? }))
}

fn alternatives_create(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let input = group_input(req)?;
    let settings = load_settings(conn)?;
    let group = registry::create(conn, &principal, &settings, &input)?;
    Ok(json!({
        "groupId": group.id,
        "group": to_json(&group)?,
        "message": format!("group \"{}\" created", group.name)
    }))
}

fn alternatives_update(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let group_id = param_i64(req, "groupId")?;
    let input = group_input(req)?;
    let settings = load_settings(conn)?;
    let out = registry::update(conn, &principal, &settings, group_id, &input)?;
    let message = if out.pruned > 0 {
        format!(
            "group \"{}\" updated, {} assignment(s) outside the group removed",
            out.group.name, out.pruned
        )
    } else {
        format!("group \"{}\" updated", out.group.name)
    };
    Ok(json!({
        "group": to_json(&out.group)?,
        "pruned": out.pruned,
        "message": message
    }))
}

fn alternatives_delete(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let group_id = param_i64(req, "groupId")?;
    let removed = registry::delete(conn, &principal, group_id)?;
    Ok(json!({
        "groupId": group_id,
        "removedAssignments": removed,
        "message": format!("group deleted with {} assignment(s)", removed)
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "alternatives.list" => Some(respond(req, alternatives_list(state, req))),
        "alternatives.get" => Some(respond(req, alternatives_get(state, req))),
        "alternatives.create" => Some(respond(req, alternatives_create(state, req))),
        "alternatives.update" => Some(respond(req, alternatives_update(state, req))),
        "alternatives.delete" => Some(respond(req, alternatives_delete(state, req))),
        _ => None,
    }
}
