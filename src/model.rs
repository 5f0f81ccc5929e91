use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ClassId = i64;
pub type SubjectId = i64;
pub type StudentId = i64;
pub type GroupId = i64;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub program: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub class_id: ClassId,
    pub last_name: String,
    pub first_name: String,
    pub student_no: Option<String>,
    pub display_name: String,
}

impl Student {
    pub fn new(
        id: StudentId,
        class_id: ClassId,
        last_name: String,
        first_name: String,
        student_no: Option<String>,
    ) -> Self {
        let display_name = format!("{}, {}", last_name, first_name);
        Self {
            id,
            class_id,
            last_name,
            first_name,
            student_no,
            display_name,
        }
    }
}

/// Ordered, duplicate-free list of at least two subject ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubjectSet(Vec<SubjectId>);

impl SubjectSet {
    pub const MIN_SUBJECTS: usize = 2;

    pub fn new(ids: Vec<SubjectId>) -> EngineResult<Self> {
        if ids.len() < Self::MIN_SUBJECTS {
            return Err(EngineError::validation(format!(
                "an alternative group needs at least {} subjects",
                Self::MIN_SUBJECTS
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(*id) {
                return Err(EngineError::validation(format!(
                    "subject {} is listed more than once",
                    id
                )));
            }
        }
        Ok(Self(ids))
    }

    /// Parses the stored `subject_ids` column.
    pub fn from_column(raw: &str) -> EngineResult<Self> {
        let ids: Vec<SubjectId> = serde_json::from_str(raw).map_err(|e| {
            EngineError::Constraint(format!("stored subject list is not valid JSON: {}", e))
        })?;
        Self::new(ids).map_err(|e| EngineError::Constraint(format!("stored subject list: {}", e)))
    }

    pub fn to_column(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn contains(&self, id: SubjectId) -> bool {
        self.0.contains(&id)
    }

    pub fn ids(&self) -> &[SubjectId] {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeGroup {
    pub id: GroupId,
    pub class_id: ClassId,
    pub name: String,
    pub subject_ids: SubjectSet,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub student_id: StudentId,
    pub group_id: GroupId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Staff,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// The acting user, supplied by the host for every registry/engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn require_admin(&self) -> EngineResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(EngineError::Forbidden(format!(
                "user {} is not an administrator",
                self.user_id
            )))
        }
    }
}
