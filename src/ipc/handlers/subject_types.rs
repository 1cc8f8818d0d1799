use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::SubjectType;

fn name_taken(state: &AppState, name: &str, exclude_id: Option<&str>) -> bool {
    state.store.subject_types.iter().any(|t| {
        t.name.eq_ignore_ascii_case(name) && Some(t.id.as_str()) != exclude_id
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "subjectTypes": state.store.subject_types }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match helpers::req_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let code = match helpers::opt_str(&req.params, "code") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let is_active = match helpers::opt_bool(&req.params, "isActive") {
        Ok(v) => v.unwrap_or(true),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if name_taken(state, &name, None) {
        return err(
            &req.id,
            "validation_failed",
            format!("subject type {} already exists", name),
            None,
        );
    }

    let subject_type = SubjectType {
        id: Uuid::new_v4().to_string(),
        name,
        code,
        is_active,
    };
    let result = json!({ "subjectType": subject_type });

    let mut types = state.store.subject_types.clone();
    types.push(subject_type);
    state.store.subject_types = types;

    ok(&req.id, result)
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let type_id = match helpers::req_str(&req.params, "typeId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state.store.subject_types.iter().position(|t| t.id == type_id) else {
        return err(&req.id, "not_found", "subject type not found", None);
    };

    let name = match helpers::opt_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let code = match helpers::opt_str(&req.params, "code") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let is_active = match helpers::opt_bool(&req.params, "isActive") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if let Some(n) = &name {
        if n.is_empty() {
            return err(&req.id, "bad_params", "name must not be empty", None);
        }
        if name_taken(state, n, Some(&type_id)) {
            return err(
                &req.id,
                "validation_failed",
                format!("subject type {} already exists", n),
                None,
            );
        }
    }

    let mut types = state.store.subject_types.clone();
    {
        let t = &mut types[pos];
        if let Some(v) = name {
            t.name = v;
        }
        if let Some(v) = code {
            t.code = v;
        }
        if let Some(v) = is_active {
            t.is_active = v;
        }
    }
    let result = json!({ "subjectType": types[pos] });
    state.store.subject_types = types;

    ok(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let type_id = match helpers::req_str(&req.params, "typeId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if !state.store.subject_types.iter().any(|t| t.id == type_id) {
        return err(&req.id, "not_found", "subject type not found", None);
    }

    let types: Vec<SubjectType> = state
        .store
        .subject_types
        .iter()
        .filter(|t| t.id != type_id)
        .cloned()
        .collect();
    state.store.subject_types = types;

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjectTypes.list" => Some(handle_list(state, req)),
        "subjectTypes.create" => Some(handle_create(state, req)),
        "subjectTypes.update" => Some(handle_update(state, req)),
        "subjectTypes.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
