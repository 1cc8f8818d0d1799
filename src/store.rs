use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One labeled interval of a grading scale. Bounds are nullable because the
/// UI writes them field by field; a band with a missing bound is simply
/// skipped by overlap detection until both ends exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: String,
    pub grade: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub points: f64,
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingScale {
    pub id: String,
    pub name: String,
    pub bands: Vec<Band>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub room_no: String,
    pub capacity: i64,
    pub room_type: String,
    pub facilities: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectType {
    pub id: String,
    pub name: String,
    pub code: String,
    pub is_active: bool,
}

/// `group_id` is a weak back-reference into the elective group collection.
/// It is non-null only while a group with that id exists; membership is
/// always recomputed by filtering on it, never stored on the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub is_optional: bool,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectiveGroup {
    pub group_id: String,
    pub group_name: String,
    pub min_select: i64,
    pub max_select: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLine {
    pub id: String,
    pub fee_head: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTemplate {
    pub id: String,
    pub name: String,
    pub academic_year: String,
    pub lines: Vec<FeeLine>,
}

/// The whole in-memory data set. Handlers never mutate rows in place: they
/// read a collection, compute the replacement, and swap it wholesale, so a
/// failed validation always leaves the previous state intact.
#[derive(Debug, Default)]
pub struct Store {
    pub grading_scales: Vec<GradingScale>,
    pub rooms: Vec<Room>,
    pub subject_types: Vec<SubjectType>,
    pub subjects: Vec<Subject>,
    pub elective_groups: Vec<ElectiveGroup>,
    pub fee_templates: Vec<FeeTemplate>,
}

impl Store {
    pub fn scale(&self, id: &str) -> Option<&GradingScale> {
        self.grading_scales.iter().find(|s| s.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&ElectiveGroup> {
        self.elective_groups.iter().find(|g| g.group_id == id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Membership is an attribute lookup over the subject arena.
    pub fn group_member_ids(&self, group_id: &str) -> Vec<String> {
        self.subjects
            .iter()
            .filter(|s| s.group_id.as_deref() == Some(group_id))
            .map(|s| s.id.clone())
            .collect()
    }
}

/// A freshly added band starts at zero bounds; the user edits from there.
pub fn default_band() -> Band {
    Band {
        id: uuid::Uuid::new_v4().to_string(),
        grade: String::new(),
        min_value: Some(0.0),
        max_value: Some(0.0),
        points: 0.0,
        remarks: String::new(),
    }
}
