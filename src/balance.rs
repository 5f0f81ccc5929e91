use crate::model::{StudentId, SubjectId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePlan {
    pub placements: Vec<Placement>,
    /// Per-subject counts after the placements are applied.
    pub final_counts: BTreeMap<SubjectId, usize>,
}

/// Greedy "fill the emptiest bucket" distribution of the unassigned pool.
///
/// Each student, in the given order, goes to the subject with the fewest
/// students so far; ties go to the lowest subject id. Existing counts are
/// taken as-is and never reduced.
pub fn plan_balance(counts: &[(SubjectId, usize)], unassigned: &[StudentId]) -> BalancePlan {
    let mut running: BTreeMap<SubjectId, usize> = counts.iter().copied().collect();
    let mut placements = Vec::with_capacity(unassigned.len());

    if running.is_empty() {
        return BalancePlan {
            placements,
            final_counts: running,
        };
    }

    for &student_id in unassigned {
        // BTreeMap iterates in ascending subject id, so min_by_key keeps the lowest id on ties.
        let Some((&subject_id, _)) = running.iter().min_by_key(|(_, n)| **n) else {
            break;
        };
        if let Some(n) = running.get_mut(&subject_id) {
            *n += 1;
        }
        placements.push(Placement {
            student_id,
            subject_id,
        });
    }

    BalancePlan {
        placements,
        final_counts: running,
    }
}

pub fn spread(counts: &BTreeMap<SubjectId, usize>) -> usize {
    let max = counts.values().copied().max().unwrap_or(0);
    let min = counts.values().copied().min().unwrap_or(0);
    max - min
}
