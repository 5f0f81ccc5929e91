//! Student-to-subject assignment within alternative groups.
//!
//! Every mutation keeps at most one `special_class` row per (student, group):
//! moves are single-row upserts, and each operation runs in one transaction.

use crate::balance::{plan_balance, spread};
use crate::directory;
use crate::error::{EngineError, EngineResult};
use crate::model::{
    AlternativeGroup, Assignment, ClassId, ClassInfo, GroupId, Principal, Student, StudentId,
    SubjectId,
};
use crate::registry;
use crate::roster;
use crate::settings::AlternativesSettings;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAssignments {
    pub class: ClassInfo,
    pub groups: Vec<AlternativeGroup>,
    pub students: Vec<Student>,
    pub assignments: BTreeMap<GroupId, BTreeMap<SubjectId, Vec<Student>>>,
    pub unassigned: BTreeMap<GroupId, Vec<Student>>,
    pub orphaned: BTreeMap<GroupId, Vec<Student>>,
}

#[derive(Debug, Clone)]
pub struct AssignRequest {
    pub student_ids: Vec<StudentId>,
    pub subject_id: SubjectId,
    pub group_id: GroupId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOutcome {
    /// Previously unassigned students now placed.
    pub assigned: usize,
    /// Students moved from another subject of the group.
    pub moved: usize,
    /// Students already in the target subject.
    pub unchanged: usize,
}

impl AssignOutcome {
    pub fn message(&self) -> String {
        format!(
            "{} student(s) assigned, {} moved, {} already in subject",
            self.assigned, self.moved, self.unchanged
        )
    }
}

#[derive(Debug, Clone)]
pub struct UnassignRequest {
    pub student_ids: Vec<StudentId>,
    pub group_id: GroupId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignOutcome {
    pub removed: usize,
    pub unchanged: usize,
}

impl UnassignOutcome {
    pub fn message(&self) -> String {
        format!(
            "{} student(s) returned to the unassigned pool",
            self.removed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOutcome {
    pub group_id: GroupId,
    pub placed: usize,
    pub counts: BTreeMap<SubjectId, usize>,
}

impl BalanceOutcome {
    pub fn message(&self) -> String {
        if self.placed == 0 {
            "no unassigned students to distribute".to_string()
        } else {
            format!("{} student(s) distributed", self.placed)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBalanceResult {
    pub group_id: GroupId,
    pub group_name: String,
    pub ok: bool,
    pub placed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAllOutcome {
    pub class_id: ClassId,
    pub results: Vec<GroupBalanceResult>,
    pub balanced: usize,
    pub failed: usize,
}

impl BalanceAllOutcome {
    pub fn message(&self) -> String {
        let placed: usize = self.results.iter().map(|r| r.placed).sum();
        if self.failed == 0 {
            format!(
                "{} group(s) balanced, {} student(s) distributed",
                self.balanced, placed
            )
        } else {
            format!(
                "{} group(s) balanced, {} failed, {} student(s) distributed",
                self.balanced, self.failed, placed
            )
        }
    }
}

fn upsert_assignment(conn: &Connection, a: &Assignment, at: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO special_class(student_id, group_id, subject_id, class_id, assigned_at)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(student_id, group_id) DO UPDATE SET
           subject_id = excluded.subject_id,
           class_id = excluded.class_id,
           assigned_at = excluded.assigned_at",
        (a.student_id, a.group_id, a.subject_id, a.class_id, at),
    )
}

fn current_subject(
    conn: &Connection,
    student_id: StudentId,
    group_id: GroupId,
) -> rusqlite::Result<Option<SubjectId>> {
    conn.query_row(
        "SELECT subject_id FROM special_class WHERE student_id = ? AND group_id = ?",
        (student_id, group_id),
        |r| r.get(0),
    )
    .optional()
}

/// Order-preserving dedupe of the requested ids.
fn unique_ids(ids: &[StudentId]) -> Vec<StudentId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Bulk moves need at least one student and stay within `maxBulkAssign`.
fn check_selection(student_ids: &[StudentId], settings: &AlternativesSettings) -> EngineResult<()> {
    if student_ids.is_empty() {
        return Err(EngineError::validation("no students selected"));
    }
    if student_ids.len() as i64 > settings.max_bulk_assign {
        return Err(EngineError::validation(format!(
            "at most {} students can be changed at once",
            settings.max_bulk_assign
        )));
    }
    Ok(())
}

/// Shared checks for bulk moves: the group exists, belongs to the class, and
/// every student is on the class roster.
fn resolve_group_for_class(
    conn: &Connection,
    group_id: GroupId,
    class_id: ClassId,
    student_ids: &[StudentId],
) -> EngineResult<AlternativeGroup> {
    directory::class_by_id(conn, class_id)?;
    let group = registry::load_group(conn, group_id)?;
    if group.class_id != class_id {
        return Err(EngineError::validation(format!(
            "group {} does not belong to class {}",
            group_id, class_id
        )));
    }
    let roster = directory::class_roster(conn, class_id)?;
    let members = directory::roster_index(&roster);
    if let Some(missing) = student_ids.iter().find(|id| !members.contains_key(*id)) {
        return Err(EngineError::not_found("student", *missing));
    }
    Ok(group)
}

pub fn load_assignments(
    conn: &Connection,
    principal: &Principal,
    class_id: ClassId,
) -> EngineResult<ClassAssignments> {
    debug!(user = %principal.user_id, class_id, "loading assignments");
    let class = directory::class_by_id(conn, class_id)?;
    let groups = registry::groups_for_class(conn, class_id)?;
    let students = directory::class_roster(conn, class_id)?;

    let mut assignments: BTreeMap<GroupId, BTreeMap<SubjectId, Vec<Student>>> = BTreeMap::new();
    let mut unassigned = BTreeMap::new();
    let mut orphaned = BTreeMap::new();
    for group in &groups {
        let part = roster::load_partition(conn, group, &students)?;
        assignments.insert(group.id, part.by_subject.into_iter().collect());
        unassigned.insert(group.id, part.unassigned);
        orphaned.insert(group.id, part.orphaned);
    }

    Ok(ClassAssignments {
        class,
        groups,
        students,
        assignments,
        unassigned,
        orphaned,
    })
}

pub fn assign_students(
    conn: &Connection,
    principal: &Principal,
    settings: &AlternativesSettings,
    req: &AssignRequest,
) -> EngineResult<AssignOutcome> {
    principal.require_admin()?;
    let student_ids = unique_ids(&req.student_ids);
    check_selection(&student_ids, settings)?;

    let group = resolve_group_for_class(conn, req.group_id, req.class_id, &student_ids)?;
    if !group.subject_ids.contains(req.subject_id) {
        return Err(EngineError::validation(format!(
            "subject {} is not part of group \"{}\"",
            req.subject_id, group.name
        )));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut outcome = AssignOutcome::default();
    let tx = conn.unchecked_transaction()?;
    for &student_id in &student_ids {
        match current_subject(&tx, student_id, group.id)? {
            Some(s) if s == req.subject_id => {
                outcome.unchanged += 1;
                continue;
            }
            Some(_) => outcome.moved += 1,
            None => outcome.assigned += 1,
        }
        upsert_assignment(
            &tx,
            &Assignment {
                student_id,
                group_id: group.id,
                subject_id: req.subject_id,
                class_id: req.class_id,
            },
            &now,
        )?;
    }
    tx.commit()?;

    info!(
        user = %principal.user_id,
        group_id = group.id,
        class_id = req.class_id,
        subject_id = req.subject_id,
        assigned = outcome.assigned,
        moved = outcome.moved,
        unchanged = outcome.unchanged,
        "students assigned"
    );
    Ok(outcome)
}

pub fn unassign_students(
    conn: &Connection,
    principal: &Principal,
    settings: &AlternativesSettings,
    req: &UnassignRequest,
) -> EngineResult<UnassignOutcome> {
    principal.require_admin()?;
    let student_ids = unique_ids(&req.student_ids);
    check_selection(&student_ids, settings)?;
    let group = resolve_group_for_class(conn, req.group_id, req.class_id, &student_ids)?;

    let mut outcome = UnassignOutcome::default();
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt =
            tx.prepare("DELETE FROM special_class WHERE student_id = ? AND group_id = ?")?;
        for &student_id in &student_ids {
            match stmt.execute((student_id, group.id))? {
                0 => outcome.unchanged += 1,
                n => outcome.removed += n,
            }
        }
    }
    tx.commit()?;

    info!(
        user = %principal.user_id,
        group_id = group.id,
        class_id = req.class_id,
        removed = outcome.removed,
        "students unassigned"
    );
    Ok(outcome)
}

/// Places the group's unassigned students; assigned students are not moved.
pub fn auto_balance_group(
    conn: &Connection,
    principal: &Principal,
    group_id: GroupId,
) -> EngineResult<BalanceOutcome> {
    principal.require_admin()?;

    let tx = conn.unchecked_transaction()?;
    let group = registry::load_group(&tx, group_id)?;
    let students = directory::class_roster(&tx, group.class_id)?;
    let part = roster::load_partition(&tx, &group, &students)?;
    let pool: Vec<StudentId> = part.unassigned.iter().map(|s| s.id).collect();
    let plan = plan_balance(&part.counts(), &pool);

    let now = chrono::Utc::now().to_rfc3339();
    for p in &plan.placements {
        upsert_assignment(
            &tx,
            &Assignment {
                student_id: p.student_id,
                group_id: group.id,
                subject_id: p.subject_id,
                class_id: group.class_id,
            },
            &now,
        )?;
    }
    tx.commit()?;

    info!(
        user = %principal.user_id,
        group_id,
        class_id = group.class_id,
        placed = plan.placements.len(),
        counts = ?plan.final_counts,
        spread = spread(&plan.final_counts),
        "group auto-balanced"
    );
    Ok(BalanceOutcome {
        group_id,
        placed: plan.placements.len(),
        counts: plan.final_counts,
    })
}

/// Balances each group of the class in its own transaction.
///
/// A failing group is reported in the results; groups balanced before it stay balanced.
pub fn auto_balance_all(
    conn: &Connection,
    principal: &Principal,
    class_id: ClassId,
) -> EngineResult<BalanceAllOutcome> {
    principal.require_admin()?;
    directory::class_by_id(conn, class_id)?;

    let mut results = Vec::new();
    for (group_id, group_name) in registry::group_headers_for_class(conn, class_id)? {
        match auto_balance_group(conn, principal, group_id) {
            Ok(o) => results.push(GroupBalanceResult {
                group_id,
                group_name,
                ok: true,
                placed: o.placed,
                error: None,
            }),
            Err(e) => {
                warn!(group_id, class_id, error = %e, "auto-balance failed for group");
                results.push(GroupBalanceResult {
                    group_id,
                    group_name,
                    ok: false,
                    placed: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = results.iter().filter(|r| !r.ok).count();
    Ok(BalanceAllOutcome {
        class_id,
        balanced: results.len() - failed,
        failed,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GroupInput;
    use crate::test_support::{
        admin, assignment_rows, class_with_students, count_rows, open_workspace, subject_with_id,
        teacher,
    };

    struct Fixture {
        conn: Connection,
        class_id: ClassId,
        students: Vec<StudentId>,
        group_id: GroupId,
    }

    fn fixture(prefix: &str, n: usize) -> Fixture {
        let conn = open_workspace(prefix);
        let (class_id, students) = class_with_students(&conn, "SS2 Science", n);
        subject_with_id(&conn, 10, "Computing");
        subject_with_id(&conn, 11, "Biology");
        let group = registry::create(
            &conn,
            &admin(),
            &AlternativesSettings::default(),
            &GroupInput {
                class_id,
                name: "Computing/Biology".to_string(),
                subject_ids: vec![10, 11],
            },
        )
        .expect("create group");
        Fixture {
            conn,
            class_id,
            students,
            group_id: group.id,
        }
    }

    fn assign(f: &Fixture, students: &[StudentId], subject_id: SubjectId) -> EngineResult<AssignOutcome> {
        assign_students(
            &f.conn,
            &admin(),
            &AlternativesSettings::default(),
            &AssignRequest {
                student_ids: students.to_vec(),
                subject_id,
                group_id: f.group_id,
                class_id: f.class_id,
            },
        )
    }

    fn rows_in_group(f: &Fixture) -> i64 {
        count_rows(
            &f.conn,
            "SELECT COUNT(*) FROM special_class WHERE group_id = ?",
            f.group_id,
        )
    }

    #[test]
    fn auto_balance_splits_ten_students_evenly_alternating() {
        let f = fixture("subjaltd-eng-balance10", 10);
        let out = auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance");
        assert_eq!(out.placed, 10);
        assert_eq!(out.counts.get(&10), Some(&5));
        assert_eq!(out.counts.get(&11), Some(&5));

        for (i, sid) in f.students.iter().enumerate() {
            let expected = if i % 2 == 0 { 10 } else { 11 };
            assert_eq!(assignment_rows(&f.conn, *sid, f.group_id), vec![expected]);
        }
    }

    #[test]
    fn move_between_subjects_leaves_exactly_one_row() {
        let f = fixture("subjaltd-eng-move", 3);
        let x = f.students[0];
        let first = assign(&f, &[x], 10).expect("assign to 10");
        assert_eq!(first.assigned, 1);

        let second = assign(&f, &[x], 11).expect("move to 11");
        assert_eq!(second.moved, 1);
        assert_eq!(assignment_rows(&f.conn, x, f.group_id), vec![11]);
    }

    #[test]
    fn reassigning_to_the_same_subject_is_a_no_op() {
        let f = fixture("subjaltd-eng-idem", 2);
        assign(&f, &f.students, 10).expect("first");
        let again = assign(&f, &f.students, 10).expect("again");
        assert_eq!(again, AssignOutcome { assigned: 0, moved: 0, unchanged: 2 });
        assert_eq!(rows_in_group(&f), 2);
    }

    #[test]
    fn duplicate_ids_in_one_request_count_once() {
        let f = fixture("subjaltd-eng-dupe", 2);
        let s = f.students[1];
        let out = assign(&f, &[s, s, s], 11).expect("assign");
        assert_eq!(out.assigned, 1);
        assert_eq!(rows_in_group(&f), 1);
    }

    #[test]
    fn subject_outside_group_is_rejected_without_writes() {
        let f = fixture("subjaltd-eng-outside", 2);
        subject_with_id(&f.conn, 12, "Geography");
        let e = assign(&f, &f.students, 12).expect_err("not in group");
        assert_eq!(e.code(), "bad_params");
        assert_eq!(rows_in_group(&f), 0);
    }

    #[test]
    fn a_foreign_student_aborts_the_whole_batch() {
        let f = fixture("subjaltd-eng-foreign", 3);
        let (_, others) = class_with_students(&f.conn, "Other", 1);
        let mut batch = f.students.clone();
        batch.push(others[0]);
        let e = assign(&f, &batch, 10).expect_err("foreign student");
        assert!(matches!(e, EngineError::NotFound { entity: "student", .. }));
        assert_eq!(rows_in_group(&f), 0);
    }

    #[test]
    fn group_from_another_class_is_rejected() {
        let f = fixture("subjaltd-eng-wrong-class", 1);
        let (other_class, _) = class_with_students(&f.conn, "Other", 1);
        let e = assign_students(
            &f.conn,
            &admin(),
            &AlternativesSettings::default(),
            &AssignRequest {
                student_ids: f.students.clone(),
                subject_id: 10,
                group_id: f.group_id,
                class_id: other_class,
            },
        )
        .expect_err("wrong class");
        assert_eq!(e.code(), "bad_params");
    }

    #[test]
    fn bulk_limit_and_empty_selection_are_validated() {
        let f = fixture("subjaltd-eng-limits", 3);
        let tight = AlternativesSettings {
            max_bulk_assign: 2,
            ..AlternativesSettings::default()
        };
        let req = AssignRequest {
            student_ids: f.students.clone(),
            subject_id: 10,
            group_id: f.group_id,
            class_id: f.class_id,
        };
        let e = assign_students(&f.conn, &admin(), &tight, &req).expect_err("over limit");
        assert_eq!(e.code(), "bad_params");

        let e = assign(&f, &[], 10).expect_err("empty");
        assert_eq!(e.code(), "bad_params");
    }

    #[test]
    fn teachers_can_read_but_not_write() {
        let f = fixture("subjaltd-eng-roles", 2);
        load_assignments(&f.conn, &teacher(), f.class_id).expect("read");
        let e = auto_balance_group(&f.conn, &teacher(), f.group_id).expect_err("write");
        assert_eq!(e.code(), "forbidden");
        assert_eq!(rows_in_group(&f), 0);
    }

    #[test]
    fn balance_with_nothing_unassigned_changes_nothing() {
        let f = fixture("subjaltd-eng-balance-full", 4);
        assign(&f, &f.students[..3], 10).expect("assign three");
        assign(&f, &f.students[3..], 11).expect("assign one");

        let out = auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance");
        assert_eq!(out.placed, 0);
        assert_eq!(out.counts.get(&10), Some(&3));
        assert_eq!(out.counts.get(&11), Some(&1));
        assert_eq!(rows_in_group(&f), 4);
    }

    #[test]
    fn balance_fills_the_smaller_subject_and_keeps_existing_rows() {
        let f = fixture("subjaltd-eng-balance-partial", 7);
        assign(&f, &f.students[..3], 10).expect("pre-assign");

        let out = auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance");
        assert_eq!(out.placed, 4);
        // 3/0 -> four placements go 11, 11, 11, then tie at 3/3 -> 10.
        assert_eq!(out.counts.get(&10), Some(&4));
        assert_eq!(out.counts.get(&11), Some(&3));
        for sid in &f.students[..3] {
            assert_eq!(assignment_rows(&f.conn, *sid, f.group_id), vec![10]);
        }
    }

    #[test]
    fn unassign_returns_students_to_the_pool() {
        let f = fixture("subjaltd-eng-unassign", 3);
        assign(&f, &f.students[..2], 10).expect("assign");
        let out = unassign_students(
            &f.conn,
            &admin(),
            &AlternativesSettings::default(),
            &UnassignRequest {
                student_ids: vec![f.students[0], f.students[2]],
                group_id: f.group_id,
                class_id: f.class_id,
            },
        )
        .expect("unassign");
        assert_eq!(out, UnassignOutcome { removed: 1, unchanged: 1 });

        let view = load_assignments(&f.conn, &admin(), f.class_id).expect("load");
        let pool: Vec<StudentId> = view.unassigned[&f.group_id].iter().map(|s| s.id).collect();
        assert_eq!(pool, vec![f.students[0], f.students[2]]);
    }

    #[test]
    fn load_assignments_partitions_the_roster() {
        let f = fixture("subjaltd-eng-load", 5);
        assign(&f, &f.students[..2], 11).expect("assign");
        let view = load_assignments(&f.conn, &admin(), f.class_id).expect("load");

        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.students.len(), 5);
        let by_subject = &view.assignments[&f.group_id];
        assert!(by_subject[&10].is_empty());
        assert_eq!(by_subject[&11].len(), 2);
        assert_eq!(view.unassigned[&f.group_id].len(), 3);
        assert!(view.orphaned[&f.group_id].is_empty());

        let e = load_assignments(&f.conn, &admin(), 9999).expect_err("unknown class");
        assert_eq!(e.code(), "not_found");
    }

    #[test]
    fn partition_invariant_holds_across_mixed_operations() {
        let f = fixture("subjaltd-eng-invariant", 9);
        assign(&f, &f.students[..4], 10).expect("a");
        assign(&f, &f.students[2..6], 11).expect("b");
        auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance");
        assign(&f, &f.students[5..], 10).expect("c");
        auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance again");

        for sid in &f.students {
            assert_eq!(assignment_rows(&f.conn, *sid, f.group_id).len(), 1);
        }
        assert_eq!(rows_in_group(&f), 9);
    }

    #[test]
    fn balance_all_reports_each_group_and_tolerates_failures() {
        let f = fixture("subjaltd-eng-balance-all", 4);
        subject_with_id(&f.conn, 12, "Art");
        subject_with_id(&f.conn, 13, "Music");
        registry::create(
            &f.conn,
            &admin(),
            &AlternativesSettings::default(),
            &GroupInput {
                class_id: f.class_id,
                name: "Art/Music".to_string(),
                subject_ids: vec![12, 13],
            },
        )
        .expect("second group");
        f.conn
            .execute(
                "INSERT INTO subject_alternatives(class_id, group_name, subject_ids) VALUES(?, 'Broken', '[1]')",
                [f.class_id],
            )
            .expect("broken group");

        let out = auto_balance_all(&f.conn, &admin(), f.class_id).expect("balance all");
        let names: Vec<&str> = out.results.iter().map(|r| r.group_name.as_str()).collect();
        assert_eq!(names, vec!["Art/Music", "Broken", "Computing/Biology"]);
        assert_eq!(out.balanced, 2);
        assert_eq!(out.failed, 1);
        assert!(out.results[1].error.is_some());
        assert_eq!(out.results[0].placed, 4);
        assert_eq!(out.results[2].placed, 4);
        // The group balanced before the failure stays balanced.
        assert_eq!(rows_in_group(&f), 4);
        assert!(out.message().contains("1 failed"));

        let e = auto_balance_all(&f.conn, &admin(), 4242).expect_err("unknown class");
        assert_eq!(e.code(), "not_found");
    }

    #[test]
    fn deleting_the_group_clears_assignments_made_by_the_engine() {
        let f = fixture("subjaltd-eng-cascade", 6);
        auto_balance_group(&f.conn, &admin(), f.group_id).expect("balance");
        assert_eq!(rows_in_group(&f), 6);
        assert_eq!(registry::delete(&f.conn, &admin(), f.group_id).expect("delete"), 6);
        assert_eq!(rows_in_group(&f), 0);
    }

    fn refuse_insert_for(conn: &Connection, student_id: StudentId) {
        conn.execute_batch(&format!(
            "CREATE TEMP TRIGGER refuse_student_{student_id}
             BEFORE INSERT ON special_class
             WHEN NEW.student_id = {student_id}
             BEGIN SELECT RAISE(ABORT, 'row refused'); END;"
        ))
        .expect("install trigger");
    }

    #[test]
    fn failed_write_mid_batch_rolls_back_earlier_rows() {
        let f = fixture("subjaltd-eng-assign-rollback", 4);
        refuse_insert_for(&f.conn, f.students[2]);

        let e = assign(&f, &f.students, 10).expect_err("third insert refused");
        assert_eq!(e.code(), "constraint_failed");
        assert_eq!(rows_in_group(&f), 0);
    }

    #[test]
    fn failed_write_mid_balance_places_nobody() {
        let f = fixture("subjaltd-eng-balance-rollback", 4);
        refuse_insert_for(&f.conn, f.students[2]);

        let e = auto_balance_group(&f.conn, &admin(), f.group_id).expect_err("third insert refused");
        assert_eq!(e.code(), "constraint_failed");
        assert_eq!(rows_in_group(&f), 0);

        let view = load_assignments(&f.conn, &admin(), f.class_id).expect("load");
        assert_eq!(view.unassigned[&f.group_id].len(), 4);
    }

    #[test]
    fn unassign_respects_the_bulk_limit() {
        let f = fixture("subjaltd-eng-unassign-limit", 3);
        assign(&f, &f.students, 10).expect("assign");
        let tight = AlternativesSettings {
            max_bulk_assign: 2,
            ..AlternativesSettings::default()
        };
        let req = UnassignRequest {
            student_ids: f.students.clone(),
            group_id: f.group_id,
            class_id: f.class_id,
        };
        let e = unassign_students(&f.conn, &admin(), &tight, &req).expect_err("over limit");
        assert_eq!(e.code(), "bad_params");
        assert_eq!(rows_in_group(&f), 3);

        let e = unassign_students(
            &f.conn,
            &admin(),
            &tight,
            &UnassignRequest {
                student_ids: Vec::new(),
                ..req
            },
        )
        .expect_err("empty");
        assert_eq!(e.code(), "bad_params");
    }

    #[test]
    fn balance_ties_go_to_the_lowest_id_whatever_the_stored_order() {
        let f = fixture("subjaltd-eng-reversed", 3);
        let reversed = registry::create(
            &f.conn,
            &admin(),
            &AlternativesSettings::default(),
            &GroupInput {
                class_id: f.class_id,
                name: "Biology/Computing".to_string(),
                subject_ids: vec![11, 10],
            },
        )
        .expect("create reversed group");
        assert_eq!(reversed.subject_ids.ids(), &[11, 10]);

        auto_balance_group(&f.conn, &admin(), reversed.id).expect("balance");
        assert_eq!(assignment_rows(&f.conn, f.students[0], reversed.id), vec![10]);
        assert_eq!(assignment_rows(&f.conn, f.students[1], reversed.id), vec![11]);
        assert_eq!(assignment_rows(&f.conn, f.students[2], reversed.id), vec![10]);
    }
}
