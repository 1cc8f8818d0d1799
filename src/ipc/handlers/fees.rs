use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::{FeeLine, FeeTemplate};

fn parse_lines(params: &Value) -> Result<Vec<FeeLine>> {
    let Some(raw) = params.get("lines") else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        bail!("lines must be an array");
    };

    let mut lines = Vec::with_capacity(arr.len());
    for entry in arr {
        let fee_head = helpers::req_str(entry, "feeHead")?;
        let amount = match entry.get("amount") {
            Some(v) => helpers::finite_f64(v, "amount")?,
            None => bail!("missing amount"),
        };
        let due_date = match entry.get("dueDate") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("dueDate {} is not a YYYY-MM-DD date", s))?,
            ),
            Some(_) => bail!("dueDate must be a string or null"),
        };
        lines.push(FeeLine {
            id: Uuid::new_v4().to_string(),
            fee_head,
            amount,
            due_date,
        });
    }
    Ok(lines)
}

/// Blocking save rule: no fee line may carry a negative amount.
fn first_negative_amount(lines: &[FeeLine]) -> Option<&FeeLine> {
    lines.iter().find(|l| l.amount < 0.0)
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "templates": state.store.fee_templates }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match helpers::req_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let academic_year = match helpers::opt_str(&req.params, "academicYear") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let lines = match parse_lines(&req.params) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Some(line) = first_negative_amount(&lines) {
        return err(
            &req.id,
            "validation_failed",
            format!("amount for {} must not be negative", line.fee_head),
            None,
        );
    }

    let template = FeeTemplate {
        id: Uuid::new_v4().to_string(),
        name,
        academic_year,
        lines,
    };
    let result = json!({ "template": template });

    let mut templates = state.store.fee_templates.clone();
    templates.push(template);
    state.store.fee_templates = templates;

    ok(&req.id, result)
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let template_id = match helpers::req_str(&req.params, "templateId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state
        .store
        .fee_templates
        .iter()
        .position(|t| t.id == template_id)
    else {
        return err(&req.id, "not_found", "fee template not found", None);
    };

    let name = match helpers::opt_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let academic_year = match helpers::opt_str(&req.params, "academicYear") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Some(n) = &name {
        if n.is_empty() {
            return err(&req.id, "bad_params", "name must not be empty", None);
        }
    }

    // Repeating rows are replaced wholesale when present.
    let lines = if req.params.get("lines").is_some() {
        match parse_lines(&req.params) {
            Ok(v) => Some(v),
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        }
    } else {
        None
    };
    if let Some(lines) = &lines {
        if let Some(line) = first_negative_amount(lines) {
            return err(
                &req.id,
                "validation_failed",
                format!("amount for {} must not be negative", line.fee_head),
                None,
            );
        }
    }

    let mut templates = state.store.fee_templates.clone();
    {
        let t = &mut templates[pos];
        if let Some(v) = name {
            t.name = v;
        }
        if let Some(v) = academic_year {
            t.academic_year = v;
        }
        if let Some(v) = lines {
            t.lines = v;
        }
    }
    let result = json!({ "template": templates[pos] });
    state.store.fee_templates = templates;

    ok(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let template_id = match helpers::req_str(&req.params, "templateId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if !state.store.fee_templates.iter().any(|t| t.id == template_id) {
        return err(&req.id, "not_found", "fee template not found", None);
    }

    let templates: Vec<FeeTemplate> = state
        .store
        .fee_templates
        .iter()
        .filter(|t| t.id != template_id)
        .cloned()
        .collect();
    state.store.fee_templates = templates;

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "feeTemplates.list" => Some(handle_list(state, req)),
        "feeTemplates.create" => Some(handle_create(state, req)),
        "feeTemplates.update" => Some(handle_update(state, req)),
        "feeTemplates.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
