use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::Room;

fn room_no_taken(state: &AppState, room_no: &str, exclude_id: Option<&str>) -> bool {
    state.store.rooms.iter().any(|r| {
        r.room_no.eq_ignore_ascii_case(room_no) && Some(r.id.as_str()) != exclude_id
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "rooms": state.store.rooms }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let room_no = match helpers::req_str(&req.params, "roomNo") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let capacity = match helpers::req_i64(&req.params, "capacity") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let room_type = match helpers::opt_str(&req.params, "roomType") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let facilities = match helpers::opt_str(&req.params, "facilities") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if capacity < 0 {
        return err(
            &req.id,
            "validation_failed",
            "capacity must not be negative",
            None,
        );
    }
    if room_no_taken(state, &room_no, None) {
        return err(
            &req.id,
            "validation_failed",
            format!("room {} already exists", room_no),
            None,
        );
    }

    let room = Room {
        id: Uuid::new_v4().to_string(),
        room_no,
        capacity,
        room_type,
        facilities,
    };
    let result = json!({ "room": room });

    let mut rooms = state.store.rooms.clone();
    rooms.push(room);
    state.store.rooms = rooms;

    ok(&req.id, result)
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let room_id = match helpers::req_str(&req.params, "roomId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(pos) = state.store.rooms.iter().position(|r| r.id == room_id) else {
        return err(&req.id, "not_found", "room not found", None);
    };

    let room_no = match helpers::opt_str(&req.params, "roomNo") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let capacity = match helpers::opt_i64(&req.params, "capacity") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let room_type = match helpers::opt_str(&req.params, "roomType") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let facilities = match helpers::opt_str(&req.params, "facilities") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if let Some(n) = capacity {
        if n < 0 {
            return err(
                &req.id,
                "validation_failed",
                "capacity must not be negative",
                None,
            );
        }
    }
    if let Some(no) = &room_no {
        if no.is_empty() {
            return err(&req.id, "bad_params", "roomNo must not be empty", None);
        }
        if room_no_taken(state, no, Some(&room_id)) {
            return err(
                &req.id,
                "validation_failed",
                format!("room {} already exists", no),
                None,
            );
        }
    }

    let mut rooms = state.store.rooms.clone();
    {
        let room = &mut rooms[pos];
        if let Some(v) = room_no {
            room.room_no = v;
        }
        if let Some(v) = capacity {
            room.capacity = v;
        }
        if let Some(v) = room_type {
            room.room_type = v;
        }
        if let Some(v) = facilities {
            room.facilities = v;
        }
    }
    let result = json!({ "room": rooms[pos] });
    state.store.rooms = rooms;

    ok(&req.id, result)
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let room_id = match helpers::req_str(&req.params, "roomId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if !state.store.rooms.iter().any(|r| r.id == room_id) {
        return err(&req.id, "not_found", "room not found", None);
    }

    let rooms: Vec<Room> = state
        .store
        .rooms
        .iter()
        .filter(|r| r.id != room_id)
        .cloned()
        .collect();
    state.store.rooms = rooms;

    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rooms.list" => Some(handle_list(state, req)),
        "rooms.create" => Some(handle_create(state, req)),
        "rooms.update" => Some(handle_update(state, req)),
        "rooms.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
