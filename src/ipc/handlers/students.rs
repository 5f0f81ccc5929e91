use crate::directory;
use crate::ipc::helpers::{
    param_bool, param_i64, param_opt_str, param_str, reader, respond, to_json, writer,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn students_list(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, _) = reader(state)?;
    let class_id = param_i64(req, "classId")?;
    directory::class_by_id(conn, class_id)?;
    let students = directory::class_roster(conn, class_id)?;
    Ok(json!({ "classId": class_id, "students": to_json(&students)? }))
}

fn students_create(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let student = directory::create_student(
        conn,
        &principal,
        param_i64(req, "classId")?,
        param_str(req, "lastName")?,
        param_str(req, "firstName")?,
        param_opt_str(req, "studentNo"),
    )?;
    Ok(json!({
        "studentId": student.id,
        "student": to_json(&student)?,
        "message": format!("{} added", student.display_name)
    }))
}

fn students_set_active(state: &AppState, req: &Request) -> HandlerResult {
    let (conn, principal) = writer(state, req)?;
    let student_id = param_i64(req, "studentId")?;
    let active = param_bool(req, "active")?;
    directory::set_student_active(conn, &principal, student_id, active)?;
    Ok(json!({
        "studentId": student_id,
        "active": active,
        "message": if active { "student activated" } else { "student deactivated" }
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(respond(req, students_list(state, req))),
        "students.create" => Some(respond(req, students_create(state, req))),
        "students.setActive" => Some(respond(req, students_set_active(state, req))),
        _ => None,
    }
}
