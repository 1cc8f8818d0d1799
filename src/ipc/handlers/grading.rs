use anyhow::{bail, Result};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::rules;
use crate::store::{self, GradingScale};

/// Every band mutation answers with the updated scale plus the current
/// overlap report, so the screen can refresh its inline warning without a
/// second round trip. An overlap never fails the request.
fn scale_result(scale: &GradingScale) -> Value {
    json!({
        "scale": scale,
        "overlap": rules::find_overlap(&scale.bands),
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scales: Vec<Value> = state
        .store
        .grading_scales
        .iter()
        .map(scale_result)
        .collect();
    ok(&req.id, json!({ "scales": scales }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match helpers::req_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    // A scale is never empty; it starts with one zero-bound band.
    let scale = GradingScale {
        id: Uuid::new_v4().to_string(),
        name,
        bands: vec![store::default_band()],
    };
    let result = scale_result(&scale);

    let mut scales = state.store.grading_scales.clone();
    scales.push(scale);
    state.store.grading_scales = scales;

    ok(&req.id, result)
}

fn handle_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale_id = match helpers::req_str(&req.params, "scaleId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let name = match helpers::req_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let Some(pos) = state
        .store
        .grading_scales
        .iter()
        .position(|s| s.id == scale_id)
    else {
        return err(&req.id, "not_found", "grading scale not found", None);
    };

    let mut scales = state.store.grading_scales.clone();
    scales[pos].name = name;
    let result = scale_result(&scales[pos]);
    state.store.grading_scales = scales;

    ok(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale_id = match helpers::req_str(&req.params, "scaleId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if state.store.scale(&scale_id).is_none() {
        return err(&req.id, "not_found", "grading scale not found", None);
    }

    let scales: Vec<GradingScale> = state
        .store
        .grading_scales
        .iter()
        .filter(|s| s.id != scale_id)
        .cloned()
        .collect();
    state.store.grading_scales = scales;

    ok(&req.id, json!({ "ok": true }))
}

fn handle_add_band(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale_id = match helpers::req_str(&req.params, "scaleId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state
        .store
        .grading_scales
        .iter()
        .position(|s| s.id == scale_id)
    else {
        return err(&req.id, "not_found", "grading scale not found", None);
    };

    let mut scales = state.store.grading_scales.clone();
    scales[pos].bands.push(store::default_band());
    let result = scale_result(&scales[pos]);
    state.store.grading_scales = scales;

    ok(&req.id, result)
}

fn apply_band_patch(band: &mut store::Band, patch: &Map<String, Value>) -> Result<()> {
    for (k, v) in patch {
        match k.as_str() {
            "grade" => {
                let Some(s) = v.as_str() else {
                    bail!("grade must be a string");
                };
                band.grade = s.trim().to_string();
            }
            "minValue" => band.min_value = helpers::nullable_f64(v, k)?,
            "maxValue" => band.max_value = helpers::nullable_f64(v, k)?,
            "points" => {
                let n = helpers::finite_f64(v, k)?;
                if n < 0.0 {
                    bail!("points must not be negative");
                }
                band.points = n;
            }
            "remarks" => {
                let Some(s) = v.as_str() else {
                    bail!("remarks must be a string");
                };
                band.remarks = s.to_string();
            }
            _ => bail!("unknown band field: {}", k),
        }
    }
    Ok(())
}

fn handle_update_band(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale_id = match helpers::req_str(&req.params, "scaleId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let band_id = match helpers::req_str(&req.params, "bandId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let Some(pos) = state
        .store
        .grading_scales
        .iter()
        .position(|s| s.id == scale_id)
    else {
        return err(&req.id, "not_found", "grading scale not found", None);
    };

    let mut scales = state.store.grading_scales.clone();
    let Some(band) = scales[pos].bands.iter_mut().find(|b| b.id == band_id) else {
        return err(&req.id, "not_found", "band not found", None);
    };
    if let Err(e) = apply_band_patch(band, patch) {
        return err(&req.id, "bad_params", e.to_string(), None);
    }

    let result = scale_result(&scales[pos]);
    state.store.grading_scales = scales;

    ok(&req.id, result)
}

fn handle_remove_band(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale_id = match helpers::req_str(&req.params, "scaleId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let band_id = match helpers::req_str(&req.params, "bandId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let Some(pos) = state
        .store
        .grading_scales
        .iter()
        .position(|s| s.id == scale_id)
    else {
        return err(&req.id, "not_found", "grading scale not found", None);
    };
    if !state.store.grading_scales[pos]
        .bands
        .iter()
        .any(|b| b.id == band_id)
    {
        return err(&req.id, "not_found", "band not found", None);
    }
    if state.store.grading_scales[pos].bands.len() == 1 {
        return err(
            &req.id,
            "last_band",
            "a grading scale must keep at least one band",
            None,
        );
    }

    let mut scales = state.store.grading_scales.clone();
    scales[pos].bands.retain(|b| b.id != band_id);
    let result = scale_result(&scales[pos]);
    state.store.grading_scales = scales;

    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gradingScales.list" => Some(handle_list(state, req)),
        "gradingScales.create" => Some(handle_create(state, req)),
        "gradingScales.rename" => Some(handle_rename(state, req)),
        "gradingScales.delete" => Some(handle_delete(state, req)),
        "gradingScales.addBand" => Some(handle_add_band(state, req)),
        "gradingScales.updateBand" => Some(handle_update_band(state, req)),
        "gradingScales.removeBand" => Some(handle_remove_band(state, req)),
        _ => None,
    }
}
