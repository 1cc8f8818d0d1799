use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::store::{Band, Subject};

/// Blocking validation failures for elective group saves. Overlap between
/// grade bands is deliberately not in here: it is a warning, not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("minSelect must not be negative (got {min})")]
    NegativeMinimum { min: i64 },
    #[error("minSelect must not exceed maxSelect ({min} > {max})")]
    InvertedBounds { min: i64, max: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapSide {
    pub band_id: String,
    pub grade: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// The first conflicting pair found, in ascending `min_value` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapReport {
    pub first: OverlapSide,
    pub second: OverlapSide,
}

fn side(b: &Band, lo: f64, hi: f64) -> OverlapSide {
    OverlapSide {
        band_id: b.id.clone(),
        grade: b.grade.clone(),
        min_value: lo,
        max_value: hi,
    }
}

/// Scans a scale's bands for overlapping score ranges.
///
/// Bands missing either bound are still being entered and are skipped.
/// Complete bands are sorted by lower bound and adjacent pairs compared;
/// boundaries are inclusive, so `[0,10]` and `[10,20]` conflict. Only the
/// first conflicting pair is reported. Fewer than two complete bands can
/// never conflict.
pub fn find_overlap(bands: &[Band]) -> Option<OverlapReport> {
    let mut complete: Vec<(&Band, f64, f64)> = bands
        .iter()
        .filter_map(|b| match (b.min_value, b.max_value) {
            (Some(lo), Some(hi)) => Some((b, lo, hi)),
            _ => None,
        })
        .collect();
    if complete.len() < 2 {
        return None;
    }
    complete.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    for pair in complete.windows(2) {
        let (a, a_lo, a_hi) = pair[0];
        let (b, b_lo, b_hi) = pair[1];
        if a_hi >= b_lo {
            return Some(OverlapReport {
                first: side(a, a_lo, a_hi),
                second: side(b, b_lo, b_hi),
            });
        }
    }
    None
}

/// Recomputes group membership after a group save.
///
/// Afterwards a subject carries `group_id == Some(group_id)` exactly when its
/// id is in `selected`. Subjects that were in this group but are no longer
/// selected are unlinked. Everything else keeps its current link, including
/// links to other groups; selecting a subject that belongs elsewhere moves
/// it here, so no subject ever sits in two groups.
pub fn reconcile_members(
    subjects: &[Subject],
    group_id: &str,
    selected: &HashSet<String>,
) -> Vec<Subject> {
    subjects
        .iter()
        .map(|s| {
            let mut next = s.clone();
            if selected.contains(&s.id) {
                next.group_id = Some(group_id.to_string());
            } else if s.group_id.as_deref() == Some(group_id) {
                next.group_id = None;
            }
            next
        })
        .collect()
}

/// Cascade-null for group deletion: members lose the link, nothing else
/// about them changes, and no subject is removed.
pub fn unlink_group(subjects: &[Subject], group_id: &str) -> Vec<Subject> {
    subjects
        .iter()
        .map(|s| {
            let mut next = s.clone();
            if s.group_id.as_deref() == Some(group_id) {
                next.group_id = None;
            }
            next
        })
        .collect()
}

pub fn check_selection_bounds(min: i64, max: i64) -> Result<(), RuleError> {
    if min < 0 {
        return Err(RuleError::NegativeMinimum { min });
    }
    if min > max {
        return Err(RuleError::InvertedBounds { min, max });
    }
    Ok(())
}
