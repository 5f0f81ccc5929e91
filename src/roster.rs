use crate::error::EngineResult;
use crate::model::{AlternativeGroup, Assignment, GroupId, Student, StudentId, SubjectId};
use rusqlite::Connection;
use std::collections::HashMap;

/// A class roster split across one group's subjects.
#[derive(Debug, Clone)]
pub struct GroupPartition {
    /// One entry per subject, in the group's subject order.
    pub by_subject: Vec<(SubjectId, Vec<Student>)>,
    pub unassigned: Vec<Student>,
    /// Students whose row points at a subject no longer in the group.
    pub orphaned: Vec<Student>,
}

impl GroupPartition {
    pub fn counts(&self) -> Vec<(SubjectId, usize)> {
        self.by_subject
            .iter()
            .map(|(id, students)| (*id, students.len()))
            .collect()
    }
}

pub fn group_assignments(conn: &Connection, group_id: GroupId) -> EngineResult<Vec<Assignment>> {
    let mut stmt = conn.prepare(
        "SELECT student_id, group_id, subject_id, class_id
         FROM special_class
         WHERE group_id = ?
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([group_id], |r| {
            Ok(Assignment {
                student_id: r.get(0)?,
                group_id: r.get(1)?,
                subject_id: r.get(2)?,
                class_id: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Recomputes the partition from the roster and the stored rows.
///
/// Rows for students that are not on the roster are ignored.
pub fn partition(
    group: &AlternativeGroup,
    roster: &[Student],
    assignments: &[Assignment],
) -> GroupPartition {
    let by_student: HashMap<StudentId, SubjectId> = assignments
        .iter()
        .filter(|a| a.group_id == group.id)
        .map(|a| (a.student_id, a.subject_id))
        .collect();

    let mut by_subject: Vec<(SubjectId, Vec<Student>)> = group
        .subject_ids
        .ids()
        .iter()
        .map(|id| (*id, Vec::new()))
        .collect();
    let mut unassigned = Vec::new();
    let mut orphaned = Vec::new();

    for student in roster {
        match by_student.get(&student.id) {
            None => unassigned.push(student.clone()),
            Some(subject_id) => match by_subject.iter_mut().find(|(id, _)| id == subject_id) {
                Some((_, bucket)) => bucket.push(student.clone()),
                None => orphaned.push(student.clone()),
            },
        }
    }

    GroupPartition {
        by_subject,
        unassigned,
        orphaned,
    }
}

pub fn load_partition(
    conn: &Connection,
    group: &AlternativeGroup,
    roster: &[Student],
) -> EngineResult<GroupPartition> {
    let rows = group_assignments(conn, group.id)?;
    Ok(partition(group, roster, &rows))
}
