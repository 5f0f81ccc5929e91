//! Class, subject and student lookups.
//!
//! The roster tables are owned by the student-management side of the school
//! system; the engine only reads them. The `create_*` helpers exist so a
//! workspace can be populated without that system.

use crate::error::{EngineError, EngineResult};
use crate::model::{ClassId, ClassInfo, Principal, Student, StudentId, Subject, SubjectId};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    #[serde(flatten)]
    pub class: ClassInfo,
    pub student_count: i64,
    pub group_count: i64,
}

pub fn class_by_id(conn: &Connection, class_id: ClassId) -> EngineResult<ClassInfo> {
    conn.query_row(
        "SELECT id, name, program, level FROM classes WHERE id = ?",
        [class_id],
        |r| {
            Ok(ClassInfo {
                id: r.get(0)?,
                name: r.get(1)?,
                program: r.get(2)?,
                level: r.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| EngineError::not_found("class", class_id))
}

pub fn list_classes(conn: &Connection) -> EngineResult<Vec<ClassSummary>> {
    // Correlated subqueries avoid double-counting from joins.
    let mut stmt = conn.prepare(
        "SELECT
           c.id,
           c.name,
           c.program,
           c.level,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id AND s.active = 1),
           (SELECT COUNT(*) FROM subject_alternatives g WHERE g.class_id = c.id)
         FROM classes c
         ORDER BY c.name, c.id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(ClassSummary {
                class: ClassInfo {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    program: r.get(2)?,
                    level: r.get(3)?,
                },
                student_count: r.get(4)?,
                group_count: r.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_class(
    conn: &Connection,
    principal: &Principal,
    name: &str,
    program: Option<&str>,
    level: Option<&str>,
) -> EngineResult<ClassInfo> {
    principal.require_admin()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::validation("class name must not be empty"));
    }
    conn.execute(
        "INSERT INTO classes(name, program, level) VALUES(?, ?, ?)",
        (name, program, level),
    )?;
    class_by_id(conn, conn.last_insert_rowid())
}

pub fn list_subjects(conn: &Connection) -> EngineResult<Vec<Subject>> {
    let mut stmt = conn.prepare("SELECT id, name, code FROM subjects ORDER BY name, id")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Subject {
                id: r.get(0)?,
                name: r.get(1)?,
                code: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Resolves every id, in the order given; the first unknown id is a NotFound.
pub fn subjects_by_ids(conn: &Connection, ids: &[SubjectId]) -> EngineResult<Vec<Subject>> {
    let mut stmt = conn.prepare("SELECT id, name, code FROM subjects WHERE id = ?")?;
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        let subject = stmt
            .query_row([id], |r| {
                Ok(Subject {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    code: r.get(2)?,
                })
            })
            .optional()?
            .ok_or_else(|| EngineError::not_found("subject", id))?;
        out.push(subject);
    }
    Ok(out)
}

pub fn create_subject(
    conn: &Connection,
    principal: &Principal,
    name: &str,
    code: Option<&str>,
) -> EngineResult<Subject> {
    principal.require_admin()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::validation("subject name must not be empty"));
    }
    conn.execute(
        "INSERT INTO subjects(name, code) VALUES(?, ?)",
        (name, code),
    )?;
    Ok(Subject {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        code: code.map(str::to_string),
    })
}

/// Active students of a class in roster order.
pub fn class_roster(conn: &Connection, class_id: ClassId) -> EngineResult<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, class_id, last_name, first_name, student_no
         FROM students
         WHERE class_id = ? AND active = 1
         ORDER BY sort_order, last_name, first_name, id",
    )?;
    let rows = stmt
        .query_map([class_id], |r| {
            Ok(Student::new(
                r.get(0)?,
                r.get(1)?,
                r.get(2)?,
                r.get(3)?,
                r.get(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn roster_index(roster: &[Student]) -> HashMap<StudentId, &Student> {
    roster.iter().map(|s| (s.id, s)).collect()
}

pub fn create_student(
    conn: &Connection,
    principal: &Principal,
    class_id: ClassId,
    last_name: &str,
    first_name: &str,
    student_no: Option<&str>,
) -> EngineResult<Student> {
    principal.require_admin()?;
    class_by_id(conn, class_id)?;
    let last_name = last_name.trim();
    let first_name = first_name.trim();
    if last_name.is_empty() && first_name.is_empty() {
        return Err(EngineError::validation("student name must not be empty"));
    }
    let sort_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM students WHERE class_id = ?",
        [class_id],
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT INTO students(class_id, last_name, first_name, student_no, active, sort_order)
         VALUES(?, ?, ?, ?, 1, ?)",
        (class_id, last_name, first_name, student_no, sort_order),
    )?;
    Ok(Student::new(
        conn.last_insert_rowid(),
        class_id,
        last_name.to_string(),
        first_name.to_string(),
        student_no.map(str::to_string),
    ))
}

/// Inactive students drop off the roster; their assignment rows are kept.
pub fn set_student_active(
    conn: &Connection,
    principal: &Principal,
    student_id: StudentId,
    active: bool,
) -> EngineResult<()> {
    principal.require_admin()?;
    let changed = conn.execute(
        "UPDATE students SET active = ? WHERE id = ?",
        (active as i64, student_id),
    )?;
    if changed == 0 {
        return Err(EngineError::not_found("student", student_id));
    }
    Ok(())
}
