use crate::engine::{self, AssignRequest, UnassignRequest};
use crate::ipc::helpers::{
    load_settings, param_i64, param_i64_list, reader, respond, to_json, writer, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn assignments_load(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = reader(state)?;
    let view = engine::load_assignments(conn, &principal, param_i64(req, "classId")?)?;
    to_json(&view)
}

fn assignments_assign(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let assign = AssignRequest {
        student_ids: param_i64_list(req, "studentIds")?,
        subject_id: param_i64(req, "subjectId")?,
        group_id: param_i64(req, "groupId")?,
        class_id: param_i64(req, "classId")?,
    };
    let settings = load_settings(conn)?;
    let out = engine::assign_students(conn, &principal, &settings, &assign)?;
    let mut result = to_json(&out)?;
    result["message"] = json!(out.message());
    Ok(result)
}

fn assignments_unassign(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let unassign = UnassignRequest {
        student_ids: param_i64_list(req, "studentIds")?,
        group_id: param_i64(req, "groupId")?,
        class_id: param_i64(req, "classId")?,
    };
    let settings = load_settings(conn)?;
    let out = engine::unassign_students(conn, &principal, &settings, &unassign)?;
    let mut result = to_json(&out)?;
    result["message"] = json!(out.message());
    Ok(result)
}

fn assignments_auto_balance_group(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let out = engine::auto_balance_group(conn, &principal, param_i64(req, "groupId")?)?;
    let mut result = to_json(&out)?;
    result["message"] = json!(out.message());
    Ok(result)
}

fn assignments_auto_balance_all(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let out = engine::auto_balance_all(conn, &principal, param_i64(req, "classId")?)?;
    let mut result = to_json(&out)?;
    result["message"] = json!(out.message());
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.load" => Some(respond(req, assignments_load(state, req))),
        "assignments.assign" => Some(respond(req, assignments_assign(state, req))),
        "assignments.unassign" => Some(respond(req, assignments_unassign(state, req))),
        "assignments.autoBalanceGroup" => {
            Some(respond(req, assignments_auto_balance_group(state, req)))
        }
        "assignments.autoBalanceAll" => Some(respond(req, assignments_auto_balance_all(state, req))),
        _ => None,
    }
}
