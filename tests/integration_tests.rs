/// Integration tests for apilevelfix
///
/// These exercise process_task end to end against the seven scenarios and
/// the P1-P7 invariants.
use apilevelfix::{
    cleanup, parse, process_task, set_file_api, set_msg_api, APILevel, CancellationToken,
    DefaultLevelOracle, IdentityFormatter, Syntax, Task, TestDefaultOracle,
    TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH,
};

fn run(path: &str, content: &[u8], symbol: &str, target: APILevel) -> Task {
    Task {
        path: path.to_string(),
        content: content.to_vec(),
        symbol: symbol.to_string(),
        target_api: target,
        skip_cleanup: false,
        error_on_exempt: true,
    }
}

fn process(task: &Task, oracle: &dyn DefaultLevelOracle) -> apilevelfix::Result<Vec<u8>> {
    process_task(task, oracle, &IdentityFormatter, &CancellationToken::new()).map(|o| o.content)
}

#[test]
fn scenario_1_no_op_on_default_file() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\npackage pkg;\nmessage M {}\n".to_vec();
    let task = run(TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH, &src, "", APILevel::Opaque);
    let out = process(&task, &oracle).expect("task should succeed");
    assert_eq!(out, src, "default-level file should be left unchanged");
}

#[test]
fn scenario_2_remove_redundant_explicit_default() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\npackage pkg;\noption features.(pb.go).api_level = API_OPAQUE; // eol\n".to_vec();
    let task = run(TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH, &src, "", APILevel::Opaque);
    let out = process(&task, &oracle).expect("task should succeed");
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("api_level"), "redundant option and its EOL comment should be gone");
    assert!(!text.contains("// eol"));
}

#[test]
fn scenario_3_insert_non_default_file_level() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\npackage pkg;\nmessage M {}\n".to_vec();
    let task = run(TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH, &src, "", APILevel::Hybrid);
    let out = process(&task, &oracle).expect("task should succeed");
    let text = String::from_utf8(out).unwrap();
    let package_line = text.lines().position(|l| l.trim() == "package pkg;").unwrap();
    let option_line = text
        .lines()
        .position(|l| l.trim() == "option features.(pb.go).api_level = API_HYBRID;")
        .expect("option line should be present");
    assert_eq!(option_line, package_line + 1, "option should land directly after package");
}

#[test]
fn scenario_4_replace_file_level_option() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\npackage pkg;\noption features.(pb.go).api_level = API_OPEN;\n".to_vec();
    let task = run(TESTONLY_OPAQUE_DEFAULT_DUMMY_PATH, &src, "", APILevel::Hybrid);
    let out = process(&task, &oracle).expect("task should succeed");
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("api_level").count(), 1);
    assert!(text.contains("option features.(pb.go).api_level = API_HYBRID;"));
    assert!(!text.contains("API_OPEN"));
}

#[test]
fn scenario_5_change_nested_message_and_preserve_children() {
    let oracle = TestDefaultOracle::new(APILevel::Open);
    let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_HYBRID;\n  message A1 {\n    message A2 {}\n  }\n}\n".to_vec();
    let task = run("f.proto", &src, "A", APILevel::Open);
    let out = process(&task, &oracle).expect("task should succeed");
    let fo = parse(&out, "f.proto", &oracle).unwrap();
    let a = fo.find_by_name("A").unwrap();
    let a1 = fo.find_by_name("A.A1").unwrap();
    let a2 = fo.find_by_name("A.A1.A2").unwrap();
    assert_eq!(fo.messages[a].effective_api, APILevel::Open);
    assert_eq!(fo.messages[a1].effective_api, APILevel::Hybrid);
    assert_eq!(fo.messages[a2].effective_api, APILevel::Hybrid);
}

#[test]
fn scenario_6_leading_comment_exemption_with_error_on_exempt() {
    let oracle = TestDefaultOracle::new(APILevel::Open);
    let src = b"edition = \"2023\";\nmessage A {\n  // comment\n  option features.(pb.go).api_level = API_HYBRID;\n}\n".to_vec();
    let task = run("f.proto", &src, "A", APILevel::Open);
    let result = process(&task, &oracle);
    assert!(result.is_err(), "leading-comment-protected option must fail when errorOnExempt");
}

#[test]
fn scenario_7_cleanup_promotes_uniform_messages() {
    let oracle = TestDefaultOracle::new(APILevel::Opaque);
    let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_OPAQUE;\n}\nmessage B {\n  option features.(pb.go).api_level = API_OPAQUE;\n}\n".to_vec();
    let out = cleanup("f.proto", &src, &oracle).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("api_level"), "uniform default-level messages should all lose their explicit option");
}

#[test]
fn p1_non_mutation() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\nmessage M {}\n".to_vec();
    let task = run("f.proto", &src, "", APILevel::Hybrid);
    let snapshot = task.content.clone();
    let _ = process(&task, &oracle);
    assert_eq!(task.content, snapshot);
}

#[test]
fn p2_round_trip_of_no_op() {
    let oracle = TestDefaultOracle::new(APILevel::Open);
    let src = b"edition = \"2023\";\nmessage M {\n  option features.(pb.go).api_level = API_HYBRID;\n}\n".to_vec();
    let before = parse(&src, "f.proto", &oracle).unwrap();
    let m = before.find_by_name("M").unwrap();
    let current = before.messages[m].effective_api;

    let out = set_msg_api("f.proto", &src, "M", before.effective_api, current, &oracle, false).unwrap();
    let after = parse(&out, "f.proto", &oracle).unwrap();
    let m2 = after.find_by_name("M").unwrap();
    assert_eq!(after.messages[m2].effective_api, current);
    assert_eq!(after.roots.len(), before.roots.len());
}

#[test]
fn p3_inheritance_preservation_for_untouched_messages() {
    let oracle = TestDefaultOracle::new(APILevel::Open);
    let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_HYBRID;\n}\nmessage B {}\n".to_vec();
    let before = parse(&src, "f.proto", &oracle).unwrap();
    let b_before = before.messages[before.find_by_name("B").unwrap()].effective_api;

    let task = run("f.proto", &src, "A", APILevel::Opaque);
    let out = process(&task, &oracle).unwrap();

    let after = parse(&out, "f.proto", &oracle).unwrap();
    let b_after = after.messages[after.find_by_name("B").unwrap()].effective_api;
    assert_eq!(b_before, b_after, "message B was never named by the task, its effective level must not move");
}

#[test]
fn p4_idempotence() {
    let oracle = TestDefaultOracle::new(APILevel::Open);
    let src = b"edition = \"2023\";\nmessage A {\n  option features.(pb.go).api_level = API_OPEN;\n}\n".to_vec();
    let task = run("f.proto", &src, "A", APILevel::Hybrid);
    let once = process(&task, &oracle).unwrap();

    let task2 = run("f.proto", &once, "A", APILevel::Hybrid);
    let twice = process(&task2, &oracle).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn p5_import_sync_added_and_removed() {
    let oracle = TestDefaultOracle::default();
    let uses_features = b"edition = \"2023\";\npackage pkg;\noption features.(pb.go).api_level = API_HYBRID;\n";
    let out = cleanup("f.proto", uses_features, &oracle).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("google/protobuf/go_features.proto"));

    let no_longer_uses = b"edition = \"2023\";\nimport \"google/protobuf/go_features.proto\";\npackage pkg;\nmessage A {}\n";
    let out = cleanup("f.proto", no_longer_uses, &oracle).unwrap();
    assert!(!String::from_utf8(out).unwrap().contains("go_features.proto"));
}

#[test]
fn p6_cleanup_uniformity_no_redundant_option_survives() {
    let oracle = TestDefaultOracle::new(APILevel::Hybrid);
    let src = b"edition = \"2023\";\noption features.(pb.go).api_level = API_HYBRID;\nmessage A {\n  option features.(pb.go).api_level = API_HYBRID;\n}\n";
    let out = cleanup("f.proto", src, &oracle).unwrap();
    let fo = parse(&out, "f.proto", &oracle).unwrap();
    for id in fo.iter_messages() {
        let node = fo.message(id);
        if let Some(info) = &node.api_info {
            if !info.has_leading_comment {
                assert_ne!(
                    node.effective_api,
                    fo.parent_effective_api(id),
                    "explicit option on {} is redundant and should have been removed",
                    node.name
                );
            }
        }
    }
}

#[test]
fn file_level_edit_rejects_non_editions_syntax() {
    let oracle = TestDefaultOracle::default();
    let src = b"syntax = \"proto3\";\npackage pkg;\n".to_vec();
    let result = set_file_api("f.proto", &src, APILevel::Hybrid, &oracle, false, true);
    assert!(result.is_err());
}

#[test]
fn unknown_symbol_task_fails_with_unknown_symbol() {
    let oracle = TestDefaultOracle::default();
    let src = b"edition = \"2023\";\nmessage A {}\n".to_vec();
    let task = run("f.proto", &src, "DoesNotExist", APILevel::Hybrid);
    let result = process(&task, &oracle);
    assert!(result.is_err());
}

#[test]
fn task_content_sourced_from_a_real_file_on_disk() {
    use std::io::Write;

    let oracle = TestDefaultOracle::default();
    let mut file = tempfile::NamedTempFile::new().expect("create temp schema file");
    write!(file, "edition = \"2023\";\npackage pkg;\nmessage M {{}}\n").unwrap();
    let content = std::fs::read(file.path()).expect("read temp schema file back");

    let task = run(
        file.path().to_str().unwrap(),
        &content,
        "",
        APILevel::Hybrid,
    );
    let out = process(&task, &oracle).expect("task should succeed");
    assert!(String::from_utf8(out).unwrap().contains("API_HYBRID"));
}

#[test]
fn legacy_syntax_round_trips_through_parse() {
    let oracle = TestDefaultOracle::default();
    let src = b"syntax = \"proto2\";\nmessage A {\n  option go_api_flag = \"OPEN_TO_OPAQUE_HYBRID\";\n}\n".to_vec();
    let fo = parse(&src, "f.proto", &oracle).unwrap();
    assert_eq!(fo.syntax, Syntax::Proto2);
    let a = fo.find_by_name("A").unwrap();
    assert_eq!(fo.messages[a].effective_api, APILevel::Hybrid);
}
