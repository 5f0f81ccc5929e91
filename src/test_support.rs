use crate::db;
use crate::directory;
use crate::model::{ClassId, Principal, Role, StudentId, SubjectId};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn open_workspace(prefix: &str) -> Connection {
    db::open_db(&temp_dir(prefix)).expect("open workspace")
}

pub fn admin() -> Principal {
    Principal::new("admin-1", Role::Admin)
}

pub fn teacher() -> Principal {
    Principal::new("teacher-1", Role::Teacher)
}

pub fn subject_with_id(conn: &Connection, id: SubjectId, name: &str) -> SubjectId {
    conn.execute("INSERT INTO subjects(id, name) VALUES(?, ?)", (id, name))
        .expect("insert subject");
    id
}

pub fn class_with_students(conn: &Connection, name: &str, n: usize) -> (ClassId, Vec<StudentId>) {
    let class = directory::create_class(conn, &admin(), name, Some("Science"), Some("SS2"))
        .expect("create class");
    let students = (0..n)
        .map(|i| {
            directory::create_student(
                conn,
                &admin(),
                class.id,
                &format!("Student{:02}", i),
                "Test",
                None,
            )
            .expect("create student")
            .id
        })
        .collect();
    (class.id, students)
}

pub fn assignment_rows(conn: &Connection, student_id: StudentId, group_id: i64) -> Vec<SubjectId> {
    let mut stmt = conn
        .prepare("SELECT subject_id FROM special_class WHERE student_id = ? AND group_id = ?")
        .expect("prepare");
    stmt.query_map((student_id, group_id), |r| r.get(0))
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows")
}

pub fn count_rows(conn: &Connection, sql: &str, id: i64) -> i64 {
    conn.query_row(sql, [id], |r| r.get(0)).expect("count")
}
