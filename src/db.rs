use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "subjaltd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            program TEXT,
            level TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_id INTEGER NOT NULL,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            student_no TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class_sort ON students(class_id, sort_order)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_alternatives(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_id INTEGER NOT NULL,
            group_name TEXT NOT NULL,
            subject_ids TEXT NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    ensure_subject_alternatives_timestamps(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subject_alternatives_class ON subject_alternatives(class_id)",
        [],
    )?;

    // One row per (student, group): the storage side of the partition invariant.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS special_class(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            class_id INTEGER NOT NULL,
            assigned_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(group_id) REFERENCES subject_alternatives(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(class_id) REFERENCES classes(id),
            UNIQUE(student_id, group_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_special_class_group ON special_class(group_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_special_class_class ON special_class(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, raw),
    )?;
    Ok(())
}

fn ensure_subject_alternatives_timestamps(conn: &Connection) -> anyhow::Result<()> {
    // Early workspaces stored groups without audit columns.
    if !table_has_column(conn, "subject_alternatives", "created_at")? {
        conn.execute(
            "ALTER TABLE subject_alternatives ADD COLUMN created_at TEXT",
            [],
        )?;
    }
    if !table_has_column(conn, "subject_alternatives", "updated_at")? {
        conn.execute(
            "ALTER TABLE subject_alternatives ADD COLUMN updated_at TEXT",
            [],
        )?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;

    #[test]
    fn open_db_is_idempotent() {
        let ws = temp_dir("subjaltd-db-open");
        let conn = open_db(&ws).expect("first open");
        drop(conn);
        let conn = open_db(&ws).expect("second open");
        assert!(table_has_column(&conn, "special_class", "subject_id").expect("columns"));
        assert!(table_has_column(&conn, "subject_alternatives", "updated_at").expect("columns"));
    }

    #[test]
    fn legacy_group_table_gains_timestamp_columns() {
        let ws = temp_dir("subjaltd-db-migrate");
        {
            let conn = Connection::open(ws.join(DB_FILE_NAME)).expect("raw open");
            conn.execute(
                "CREATE TABLE subject_alternatives(
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    class_id INTEGER NOT NULL,
                    group_name TEXT NOT NULL,
                    subject_ids TEXT NOT NULL
                )",
                [],
            )
            .expect("legacy table");
        }
        let conn = open_db(&ws).expect("open");
        assert!(table_has_column(&conn, "subject_alternatives", "created_at").expect("columns"));
        assert!(table_has_column(&conn, "subject_alternatives", "updated_at").expect("columns"));
    }

    #[test]
    fn second_row_for_the_same_student_and_group_is_refused() {
        let ws = temp_dir("subjaltd-db-unique");
        let conn = open_db(&ws).expect("open");
        conn.execute("INSERT INTO classes(id, name) VALUES(1, 'C')", []).expect("class");
        conn.execute("INSERT INTO subjects(id, name) VALUES(10, 'A'), (11, 'B')", [])
            .expect("subjects");
        conn.execute(
            "INSERT INTO students(id, class_id, last_name, first_name, sort_order) VALUES(1, 1, 'L', 'F', 0)",
            [],
        )
        .expect("student");
        conn.execute(
            "INSERT INTO subject_alternatives(id, class_id, group_name, subject_ids) VALUES(5, 1, 'G', '[10,11]')",
            [],
        )
        .expect("group");
        conn.execute(
            "INSERT INTO special_class(student_id, group_id, subject_id, class_id) VALUES(1, 5, 10, 1)",
            [],
        )
        .expect("first row");
        assert!(conn
            .execute(
                "INSERT INTO special_class(student_id, group_id, subject_id, class_id) VALUES(1, 5, 11, 1)",
                [],
            )
            .is_err());
    }

    #[test]
    fn settings_round_trip_and_overwrite() {
        let ws = temp_dir("subjaltd-db-settings");
        let conn = open_db(&ws).expect("open");
        assert!(settings_get_json(&conn, "setup.alternatives")
            .expect("get")
            .is_none());
        settings_set_json(&conn, "setup.alternatives", &serde_json::json!({ "a": 1 }))
            .expect("set");
        settings_set_json(&conn, "setup.alternatives", &serde_json::json!({ "a": 2 }))
            .expect("overwrite");
        let v = settings_get_json(&conn, "setup.alternatives")
            .expect("get")
            .expect("present");
        assert_eq!(v["a"], 2);
    }
}
