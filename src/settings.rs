use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ALTERNATIVES_KEY: &str = "setup.alternatives";

const MAX_BULK_ASSIGN_LIMIT: i64 = 5000;

/// Workspace-level behavior switches for alternative groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlternativesSettings {
    /// Reject a group whose subject is already used by another group of the same class.
    pub exclusive_subjects: bool,
    /// Delete assignments left pointing outside a group after it is edited.
    pub prune_orphans_on_update: bool,
    pub max_bulk_assign: i64,
}

impl Default for AlternativesSettings {
    fn default() -> Self {
        Self {
            exclusive_subjects: false,
            prune_orphans_on_update: false,
            max_bulk_assign: 1000,
        }
    }
}

impl AlternativesSettings {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        match db::settings_get_json(conn, ALTERNATIVES_KEY)? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, ALTERNATIVES_KEY, &serde_json::to_value(self)?)
    }

    /// Applies a partial update, validating each key.
    pub fn apply_patch(&self, patch: &Map<String, Value>) -> Result<Self, String> {
        let mut next = self.clone();
        for (key, v) in patch {
            match key.as_str() {
                "exclusiveSubjects" => next.exclusive_subjects = parse_bool(v, key)?,
                "pruneOrphansOnUpdate" => next.prune_orphans_on_update = parse_bool(v, key)?,
                "maxBulkAssign" => {
                    next.max_bulk_assign = parse_i64_range(v, key, 1, MAX_BULK_ASSIGN_LIMIT)?
                }
                other => return Err(format!("unknown setting: {}", other)),
            }
        }
        Ok(next)
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}
