use std::collections::HashSet;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::rules;
use crate::store::ElectiveGroup;

fn group_json(state: &AppState, group: &ElectiveGroup) -> Value {
    json!({
        "groupId": group.group_id,
        "groupName": group.group_name,
        "minSelect": group.min_select,
        "maxSelect": group.max_select,
        "memberSubjectIds": state.store.group_member_ids(&group.group_id),
    })
}

/// Selected subjects must exist and be optional. Returns the blocking
/// validation message for the first offender, if any.
fn check_selection(state: &AppState, selected: &[String]) -> Option<String> {
    for id in selected {
        match state.store.subject(id) {
            None => return Some(format!("unknown subject: {}", id)),
            Some(s) if !s.is_optional => {
                return Some(format!(
                    "subject {} is not optional and cannot join an elective group",
                    s.subject_code
                ))
            }
            Some(_) => {}
        }
    }
    None
}

/// Subjects currently linked to some other group that the user explicitly
/// selected anyway. They will be moved; the UI shows its "already in
/// another group" badge from this list.
fn moved_from_other_groups(state: &AppState, group_id: &str, selected: &[String]) -> Vec<String> {
    selected
        .iter()
        .filter(|id| {
            state
                .store
                .subject(id)
                .and_then(|s| s.group_id.as_deref())
                .map(|g| g != group_id)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let groups: Vec<Value> = state
        .store
        .elective_groups
        .iter()
        .map(|g| group_json(state, g))
        .collect();
    ok(&req.id, json!({ "groups": groups }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let group_name = match helpers::req_str(&req.params, "groupName") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let min_select = match helpers::req_i64(&req.params, "minSelect") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let max_select = match helpers::req_i64(&req.params, "maxSelect") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let subject_ids = match helpers::req_id_list(&req.params, "subjectIds") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if let Err(e) = rules::check_selection_bounds(min_select, max_select) {
        return err(
            &req.id,
            "validation_failed",
            e.to_string(),
            Some(json!({ "minSelect": min_select, "maxSelect": max_select })),
        );
    }
    if let Some(msg) = check_selection(state, &subject_ids) {
        return err(&req.id, "validation_failed", msg, None);
    }

    let group_id = Uuid::new_v4().to_string();
    let moved = moved_from_other_groups(state, &group_id, &subject_ids);
    let selected: HashSet<String> = subject_ids.into_iter().collect();

    state.store.subjects = rules::reconcile_members(&state.store.subjects, &group_id, &selected);
    let group = ElectiveGroup {
        group_id,
        group_name,
        min_select,
        max_select,
    };
    let mut groups = state.store.elective_groups.clone();
    groups.push(group.clone());
    state.store.elective_groups = groups;

    ok(
        &req.id,
        json!({
            "group": group_json(state, &group),
            "movedSubjectIds": moved,
        }),
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let group_id = match helpers::req_str(&req.params, "groupId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state
        .store
        .elective_groups
        .iter()
        .position(|g| g.group_id == group_id)
    else {
        return err(&req.id, "not_found", "elective group not found", None);
    };

    let group_name = match helpers::opt_str(&req.params, "groupName") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let min_select = match helpers::opt_i64(&req.params, "minSelect") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let max_select = match helpers::opt_i64(&req.params, "maxSelect") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    // The edit modal always submits the full selection, so membership is
    // reconciled against it rather than patched incrementally.
    let subject_ids = match helpers::req_id_list(&req.params, "subjectIds") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if let Some(n) = &group_name {
        if n.is_empty() {
            return err(&req.id, "bad_params", "groupName must not be empty", None);
        }
    }

    let current = &state.store.elective_groups[pos];
    let next_min = min_select.unwrap_or(current.min_select);
    let next_max = max_select.unwrap_or(current.max_select);
    if let Err(e) = rules::check_selection_bounds(next_min, next_max) {
        return err(
            &req.id,
            "validation_failed",
            e.to_string(),
            Some(json!({ "minSelect": next_min, "maxSelect": next_max })),
        );
    }
    if let Some(msg) = check_selection(state, &subject_ids) {
        return err(&req.id, "validation_failed", msg, None);
    }

    let moved = moved_from_other_groups(state, &group_id, &subject_ids);
    let selected: HashSet<String> = subject_ids.into_iter().collect();

    state.store.subjects = rules::reconcile_members(&state.store.subjects, &group_id, &selected);
    let mut groups = state.store.elective_groups.clone();
    {
        let g = &mut groups[pos];
        if let Some(v) = group_name {
            g.group_name = v;
        }
        g.min_select = next_min;
        g.max_select = next_max;
    }
    let group = groups[pos].clone();
    state.store.elective_groups = groups;

    ok(
        &req.id,
        json!({
            "group": group_json(state, &group),
            "movedSubjectIds": moved,
        }),
    )
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let group_id = match helpers::req_str(&req.params, "groupId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if state.store.group(&group_id).is_none() {
        return err(&req.id, "not_found", "elective group not found", None);
    }

    // Cascade-null: members lose their link, the subjects stay.
    let cleared = state.store.group_member_ids(&group_id);
    state.store.subjects = rules::unlink_group(&state.store.subjects, &group_id);

    let groups: Vec<ElectiveGroup> = state
        .store
        .elective_groups
        .iter()
        .filter(|g| g.group_id != group_id)
        .cloned()
        .collect();
    state.store.elective_groups = groups;

    ok(&req.id, json!({ "clearedSubjectIds": cleared }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "electiveGroups.list" => Some(handle_list(state, req)),
        "electiveGroups.create" => Some(handle_create(state, req)),
        "electiveGroups.update" => Some(handle_update(state, req)),
        "electiveGroups.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
