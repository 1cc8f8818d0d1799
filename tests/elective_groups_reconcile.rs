use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schooladmind");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schooladmind");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_subject(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    name: &str,
    code: &str,
    optional: bool,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "subjects.create",
        json!({ "subjectName": name, "subjectCode": code, "isOptional": optional }),
    );
    result
        .pointer("/subject/id")
        .and_then(|v| v.as_str())
        .expect("subject id")
        .to_string()
}

fn subject_group(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    subject_id: &str,
) -> Option<String> {
    let listed = request_ok(stdin, reader, id, "subjects.list", json!({}));
    listed
        .get("subjects")
        .and_then(|v| v.as_array())
        .expect("subjects array")
        .iter()
        .find(|s| s.get("id").and_then(|v| v.as_str()) == Some(subject_id))
        .expect("subject present")
        .get("groupId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[test]
fn group_save_links_unlinks_and_keeps_other_groups_intact() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let art = create_subject(&mut stdin, &mut reader, "1", "Art", "ART", true);
    let music = create_subject(&mut stdin, &mut reader, "2", "Music", "MUS", true);
    let drama = create_subject(&mut stdin, &mut reader, "3", "Drama", "DRA", true);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "electiveGroups.create",
        json!({
            "groupName": "Arts electives",
            "minSelect": 1,
            "maxSelect": 2,
            "subjectIds": [art, drama]
        }),
    );
    let group_id = created
        .pointer("/group/groupId")
        .and_then(|v| v.as_str())
        .expect("group id")
        .to_string();
    assert_eq!(
        created
            .get("movedSubjectIds")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    // Re-save with {art, music}: music joins, drama is unlinked, art stays.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "electiveGroups.update",
        json!({
            "groupId": group_id,
            "subjectIds": [art, music]
        }),
    );
    let members = updated
        .pointer("/group/memberSubjectIds")
        .and_then(|v| v.as_array())
        .expect("members");
    assert_eq!(members.len(), 2);

    assert_eq!(
        subject_group(&mut stdin, &mut reader, "6", &art).as_deref(),
        Some(group_id.as_str())
    );
    assert_eq!(
        subject_group(&mut stdin, &mut reader, "7", &music).as_deref(),
        Some(group_id.as_str())
    );
    assert_eq!(subject_group(&mut stdin, &mut reader, "8", &drama), None);
}

#[test]
fn selecting_a_member_of_another_group_moves_it_and_reports_the_move() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let art = create_subject(&mut stdin, &mut reader, "1", "Art", "ART", true);
    let music = create_subject(&mut stdin, &mut reader, "2", "Music", "MUS", true);

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "electiveGroups.create",
        json!({
            "groupName": "Group A",
            "minSelect": 1,
            "maxSelect": 1,
            "subjectIds": [art]
        }),
    );
    let group_a = first
        .pointer("/group/groupId")
        .and_then(|v| v.as_str())
        .expect("group id")
        .to_string();

    // Explicitly selecting art for a second group steals it from the first,
    // one subject to one group, and names it in movedSubjectIds.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "electiveGroups.create",
        json!({
            "groupName": "Group B",
            "minSelect": 1,
            "maxSelect": 2,
            "subjectIds": [art, music]
        }),
    );
    let group_b = second
        .pointer("/group/groupId")
        .and_then(|v| v.as_str())
        .expect("group id")
        .to_string();
    let moved: Vec<&str> = second
        .get("movedSubjectIds")
        .and_then(|v| v.as_array())
        .expect("moved list")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(moved, vec![art.as_str()]);

    assert_eq!(
        subject_group(&mut stdin, &mut reader, "5", &art).as_deref(),
        Some(group_b.as_str())
    );

    // Group A still exists, just empty now.
    let listed = request_ok(&mut stdin, &mut reader, "6", "electiveGroups.list", json!({}));
    let groups = listed.get("groups").and_then(|v| v.as_array()).expect("groups");
    let a = groups
        .iter()
        .find(|g| g.get("groupId").and_then(|v| v.as_str()) == Some(group_a.as_str()))
        .expect("group A present");
    assert_eq!(
        a.get("memberSubjectIds").and_then(|v| v.as_array()).map(|m| m.len()),
        Some(0)
    );
}

#[test]
fn deleting_a_group_cascade_nulls_members_but_keeps_subjects() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let art = create_subject(&mut stdin, &mut reader, "1", "Art", "ART", true);
    let drama = create_subject(&mut stdin, &mut reader, "2", "Drama", "DRA", true);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "electiveGroups.create",
        json!({
            "groupName": "Arts",
            "minSelect": 1,
            "maxSelect": 2,
            "subjectIds": [art, drama]
        }),
    );
    let group_id = created
        .pointer("/group/groupId")
        .and_then(|v| v.as_str())
        .expect("group id")
        .to_string();

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "electiveGroups.delete",
        json!({ "groupId": group_id }),
    );
    let mut cleared: Vec<&str> = deleted
        .get("clearedSubjectIds")
        .and_then(|v| v.as_array())
        .expect("cleared list")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    cleared.sort();
    let mut expected = vec![art.as_str(), drama.as_str()];
    expected.sort();
    assert_eq!(cleared, expected);

    let listed = request_ok(&mut stdin, &mut reader, "5", "electiveGroups.list", json!({}));
    assert_eq!(
        listed.get("groups").and_then(|v| v.as_array()).map(|g| g.len()),
        Some(0)
    );

    // Both subjects survive, unlinked.
    assert_eq!(subject_group(&mut stdin, &mut reader, "6", &art), None);
    assert_eq!(subject_group(&mut stdin, &mut reader, "7", &drama), None);
}

#[test]
fn inverted_selection_bounds_block_the_save_and_leave_state_untouched() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let art = create_subject(&mut stdin, &mut reader, "1", "Art", "ART", true);

    let rejected = request(
        &mut stdin,
        &mut reader,
        "2",
        "electiveGroups.create",
        json!({
            "groupName": "Broken",
            "minSelect": 3,
            "maxSelect": 1,
            "subjectIds": [art]
        }),
    );
    assert_eq!(rejected.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        rejected.pointer("/error/code").and_then(|v| v.as_str()),
        Some("validation_failed")
    );

    // Nothing was created and the subject was not linked.
    let listed = request_ok(&mut stdin, &mut reader, "3", "electiveGroups.list", json!({}));
    assert_eq!(
        listed.get("groups").and_then(|v| v.as_array()).map(|g| g.len()),
        Some(0)
    );
    assert_eq!(subject_group(&mut stdin, &mut reader, "4", &art), None);
}

#[test]
fn non_optional_subjects_cannot_join_a_group() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let maths = create_subject(&mut stdin, &mut reader, "1", "Mathematics", "MAT", false);

    let rejected = request(
        &mut stdin,
        &mut reader,
        "2",
        "electiveGroups.create",
        json!({
            "groupName": "Core?",
            "minSelect": 0,
            "maxSelect": 1,
            "subjectIds": [maths]
        }),
    );
    assert_eq!(
        rejected.pointer("/error/code").and_then(|v| v.as_str()),
        Some("validation_failed")
    );
}

#[test]
fn grouped_subject_cannot_be_made_non_optional_in_place() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let art = create_subject(&mut stdin, &mut reader, "1", "Art", "ART", true);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "electiveGroups.create",
        json!({
            "groupName": "Arts",
            "minSelect": 0,
            "maxSelect": 1,
            "subjectIds": [art]
        }),
    );

    let rejected = request(
        &mut stdin,
        &mut reader,
        "3",
        "subjects.update",
        json!({ "subjectId": art, "isOptional": false }),
    );
    assert_eq!(
        rejected.pointer("/error/code").and_then(|v| v.as_str()),
        Some("validation_failed")
    );
}
