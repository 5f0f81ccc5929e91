//! Alternative-group definitions: named sets of mutually exclusive subjects
//! scoped to a class.

use crate::directory;
use crate::error::{EngineError, EngineResult};
use crate::model::{AlternativeGroup, ClassId, GroupId, Principal, SubjectId, SubjectSet};
use crate::roster;
use crate::settings::AlternativesSettings;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GroupInput {
    pub class_id: ClassId,
    pub name: String,
    pub subject_ids: Vec<SubjectId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCount {
    pub id: SubjectId,
    pub name: String,
    pub student_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: AlternativeGroup,
    pub class_name: String,
    pub subjects: Vec<SubjectCount>,
    pub unassigned_count: usize,
    pub orphaned_count: usize,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub group: AlternativeGroup,
    /// Assignment rows removed because they no longer fit the group.
    pub pruned: usize,
}

type GroupRow = (GroupId, ClassId, String, String, Option<String>, Option<String>);

fn group_from_row(row: GroupRow) -> EngineResult<AlternativeGroup> {
    let (id, class_id, name, raw_subjects, created_at, updated_at) = row;
    Ok(AlternativeGroup {
        id,
        class_id,
        name,
        subject_ids: SubjectSet::from_column(&raw_subjects)?,
        created_at,
        updated_at,
    })
}

fn read_group_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

pub fn load_group(conn: &Connection, group_id: GroupId) -> EngineResult<AlternativeGroup> {
    let row = conn
        .query_row(
            "SELECT id, class_id, group_name, subject_ids, created_at, updated_at
             FROM subject_alternatives WHERE id = ?",
            [group_id],
            read_group_row,
        )
        .optional()?
        .ok_or_else(|| EngineError::not_found("group", group_id))?;
    group_from_row(row)
}

/// Groups of one class ordered by name.
pub fn groups_for_class(conn: &Connection, class_id: ClassId) -> EngineResult<Vec<AlternativeGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, class_id, group_name, subject_ids, created_at, updated_at
         FROM subject_alternatives
         WHERE class_id = ?
         ORDER BY group_name, id",
    )?;
    let rows = stmt
        .query_map([class_id], read_group_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(group_from_row).collect()
}

/// Ids and names only; the subject column is not parsed.
pub fn group_headers_for_class(
    conn: &Connection,
    class_id: ClassId,
) -> EngineResult<Vec<(GroupId, String)>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_name FROM subject_alternatives WHERE class_id = ? ORDER BY group_name, id",
    )?;
    let rows = stmt
        .query_map([class_id], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn validate_input(
    conn: &Connection,
    settings: &AlternativesSettings,
    input: &GroupInput,
    editing: Option<GroupId>,
) -> EngineResult<(String, SubjectSet)> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(EngineError::validation("group name must not be empty"));
    }
    let subjects = SubjectSet::new(input.subject_ids.clone())?;
    directory::class_by_id(conn, input.class_id)?;
    directory::subjects_by_ids(conn, subjects.ids())?;

    if settings.exclusive_subjects {
        for other in groups_for_class(conn, input.class_id)? {
            if Some(other.id) == editing {
                continue;
            }
            if let Some(shared) = subjects.ids().iter().find(|id| other.subject_ids.contains(**id)) {
                return Err(EngineError::validation(format!(
                    "subject {} already belongs to group \"{}\" in this class",
                    shared, other.name
                )));
            }
        }
    }

    Ok((name, subjects))
}

pub fn create(
    conn: &Connection,
    principal: &Principal,
    settings: &AlternativesSettings,
    input: &GroupInput,
) -> EngineResult<AlternativeGroup> {
    principal.require_admin()?;
    let (name, subjects) = validate_input(conn, settings, input, None)?;

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO subject_alternatives(class_id, group_name, subject_ids, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?)",
        (input.class_id, &name, subjects.to_column(), &now, &now),
    )?;
    let group_id = conn.last_insert_rowid();
    info!(
        user = %principal.user_id,
        group_id,
        class_id = input.class_id,
        subjects = ?subjects.ids(),
        "alternative group created"
    );
    load_group(conn, group_id)
}

pub fn update(
    conn: &Connection,
    principal: &Principal,
    settings: &AlternativesSettings,
    group_id: GroupId,
    input: &GroupInput,
) -> EngineResult<UpdateOutcome> {
    principal.require_admin()?;
    load_group(conn, group_id)?;
    let (name, subjects) = validate_input(conn, settings, input, Some(group_id))?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE subject_alternatives
         SET class_id = ?, group_name = ?, subject_ids = ?, updated_at = ?
         WHERE id = ?",
        (
            input.class_id,
            &name,
            subjects.to_column(),
            chrono::Utc::now().to_rfc3339(),
            group_id,
        ),
    )?;

    // Without pruning, rows outside the new subject set stay and show up as orphaned.
    let mut pruned = 0;
    if settings.prune_orphans_on_update {
        let stale: Vec<_> = roster::group_assignments(&tx, group_id)?
            .into_iter()
            .filter(|a| a.class_id != input.class_id || !subjects.contains(a.subject_id))
            .collect();
        let mut stmt =
            tx.prepare("DELETE FROM special_class WHERE student_id = ? AND group_id = ?")?;
        for a in &stale {
            pruned += stmt.execute((a.student_id, group_id))?;
        }
    }
    tx.commit()?;

    info!(
        user = %principal.user_id,
        group_id,
        class_id = input.class_id,
        subjects = ?subjects.ids(),
        pruned,
        "alternative group updated"
    );
    Ok(UpdateOutcome {
        group: load_group(conn, group_id)?,
        pruned,
    })
}

/// Deletes the group together with every assignment made under it.
pub fn delete(conn: &Connection, principal: &Principal, group_id: GroupId) -> EngineResult<usize> {
    principal.require_admin()?;

    let tx = conn.unchecked_transaction()?;
    let exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM subject_alternatives WHERE id = ?",
            [group_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(EngineError::not_found("group", group_id));
    }

    // Explicit cascade, assignments first; the schema declares no ON DELETE CASCADE.
    let removed = tx.execute("DELETE FROM special_class WHERE group_id = ?", [group_id])?;
    tx.execute("DELETE FROM subject_alternatives WHERE id = ?", [group_id])?;
    tx.commit()?;

    info!(user = %principal.user_id, group_id, removed, "alternative group deleted");
    Ok(removed)
}

pub fn get(conn: &Connection, principal: &Principal, group_id: GroupId) -> EngineResult<AlternativeGroup> {
    debug!(user = %principal.user_id, group_id, "group lookup");
    load_group(conn, group_id)
}

/// All groups (optionally of one class) by class name then group name, with live counts.
pub fn list(
    conn: &Connection,
    principal: &Principal,
    class_filter: Option<ClassId>,
) -> EngineResult<Vec<GroupSummary>> {
    debug!(user = %principal.user_id, class_id = ?class_filter, "group list");
    if let Some(class_id) = class_filter {
        directory::class_by_id(conn, class_id)?;
    }

    let mut stmt = conn.prepare(
        "SELECT g.id, g.class_id, g.group_name, g.subject_ids, g.created_at, g.updated_at, c.name
         FROM subject_alternatives g
         JOIN classes c ON c.id = g.class_id
         WHERE (?1 IS NULL OR g.class_id = ?1)
         ORDER BY c.name, g.group_name, g.id",
    )?;
    let rows = stmt
        .query_map([class_filter], |r| {
            Ok((read_group_row(r)?, r.get::<_, String>(6)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let subject_names: HashMap<SubjectId, String> = directory::list_subjects(conn)?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let mut rosters = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for (row, class_name) in rows {
        let group = group_from_row(row)?;
        if !rosters.contains_key(&group.class_id) {
            rosters.insert(group.class_id, directory::class_roster(conn, group.class_id)?);
        }
        let class_roster = rosters.get(&group.class_id).map(Vec::as_slice).unwrap_or(&[]);
        let part = roster::load_partition(conn, &group, class_roster)?;

        let subjects = part
            .counts()
            .into_iter()
            .map(|(id, student_count)| SubjectCount {
                id,
                name: subject_names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("subject {}", id)),
                student_count,
            })
            .collect();
        out.push(GroupSummary {
            group,
            class_name,
            subjects,
            unassigned_count: part.unassigned.len(),
            orphaned_count: part.orphaned.len(),
        });
    }
    Ok(out)
}
