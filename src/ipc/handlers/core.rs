use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "counts": {
                "gradingScales": state.store.grading_scales.len(),
                "rooms": state.store.rooms.len(),
                "subjectTypes": state.store.subject_types.len(),
                "subjects": state.store.subjects.len(),
                "electiveGroups": state.store.elective_groups.len(),
                "feeTemplates": state.store.fee_templates.len(),
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
