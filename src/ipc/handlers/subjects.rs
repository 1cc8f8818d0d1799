use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::Subject;

fn code_taken(state: &AppState, code: &str, exclude_id: Option<&str>) -> bool {
    state.store.subjects.iter().any(|s| {
        s.subject_code.eq_ignore_ascii_case(code) && Some(s.id.as_str()) != exclude_id
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "subjects": state.store.subjects }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_name = match helpers::req_str(&req.params, "subjectName") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let subject_code = match helpers::req_str(&req.params, "subjectCode") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let is_optional = match helpers::opt_bool(&req.params, "isOptional") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if code_taken(state, &subject_code, None) {
        return err(
            &req.id,
            "validation_failed",
            format!("subject code {} already exists", subject_code),
            None,
        );
    }

    let subject = Subject {
        id: Uuid::new_v4().to_string(),
        subject_name,
        subject_code,
        is_optional,
        group_id: None,
    };
    let result = json!({ "subject": subject });

    let mut subjects = state.store.subjects.clone();
    subjects.push(subject);
    state.store.subjects = subjects;

    ok(&req.id, result)
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match helpers::req_str(&req.params, "subjectId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state.store.subjects.iter().position(|s| s.id == subject_id) else {
        return err(&req.id, "not_found", "subject not found", None);
    };

    let subject_name = match helpers::opt_str(&req.params, "subjectName") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let subject_code = match helpers::opt_str(&req.params, "subjectCode") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let is_optional = match helpers::opt_bool(&req.params, "isOptional") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if let Some(code) = &subject_code {
        if code.is_empty() {
            return err(&req.id, "bad_params", "subjectCode must not be empty", None);
        }
        if code_taken(state, code, Some(&subject_id)) {
            return err(
                &req.id,
                "validation_failed",
                format!("subject code {} already exists", code),
                None,
            );
        }
    }
    // A grouped subject cannot silently stop being optional; the group link
    // has to be removed first.
    if is_optional == Some(false) && state.store.subjects[pos].group_id.is_some() {
        return err(
            &req.id,
            "validation_failed",
            "subject belongs to an elective group; remove it from the group first",
            None,
        );
    }

    let mut subjects = state.store.subjects.clone();
    {
        let s = &mut subjects[pos];
        if let Some(v) = subject_name {
            s.subject_name = v;
        }
        if let Some(v) = subject_code {
            s.subject_code = v;
        }
        if let Some(v) = is_optional {
            s.is_optional = v;
        }
    }
    let result = json!({ "subject": subjects[pos] });
    state.store.subjects = subjects;

    ok(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match helpers::req_str(&req.params, "subjectId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if !state.store.subjects.iter().any(|s| s.id == subject_id) {
        return err(&req.id, "not_found", "subject not found", None);
    }

    let subjects: Vec<Subject> = state
        .store
        .subjects
        .iter()
        .filter(|s| s.id != subject_id)
        .cloned()
        .collect();
    state.store.subjects = subjects;

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_list(state, req)),
        "subjects.create" => Some(handle_create(state, req)),
        "subjects.update" => Some(handle_update(state, req)),
        "subjects.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
