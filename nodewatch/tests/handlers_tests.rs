use nodewatch::handlers::*;
use nodewatch_client::{Node, NodeId};
use nodewatch_core::{AppState, Settings};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;

fn plain() {
    colored::control::set_override(false);
}

#[test]
fn test_parse_id_list_keeps_order() {
    let ids = parse_id_list("3, 1,2").unwrap();
    assert_eq!(ids, vec![NodeId(3), NodeId(1), NodeId(2)]);
}

#[test]
fn test_parse_id_list_drops_repeats_and_blanks() {
    let ids = parse_id_list("1,,1, 4 ,").unwrap();
    assert_eq!(ids, vec![NodeId(1), NodeId(4)]);
}

#[test]
fn test_parse_id_list_rejects_garbage() {
    assert!(parse_id_list("1,two").is_err());
    assert!(parse_id_list(" , ").is_err());
}

#[test]
fn test_load_source_reads_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "proxies:")?;
    writeln!(temp_file, "  - name: HK 01")?;

    let content = load_source(temp_file.path())?;
    assert!(content.contains("HK 01"));
    Ok(())
}

#[test]
fn test_load_source_refuses_empty_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "   ")?;

    assert!(load_source(temp_file.path()).is_err());
    Ok(())
}

#[test]
fn test_load_source_missing_file() {
    let err = load_source(&PathBuf::from("/nonexistent/nodes.yaml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/nodes.yaml"));
}

#[test]
fn test_session_prefers_command_line_server() {
    let override_url = Url::parse("http://10.0.0.9:8000").unwrap();
    let session = Session::resolve(
        Settings::default(),
        PathBuf::from("config.toml"),
        Some(override_url.clone()),
        false,
    )
    .unwrap();
    assert_eq!(session.server, override_url);
}

#[test]
fn test_session_falls_back_to_settings_server() {
    let session =
        Session::resolve(Settings::default(), PathBuf::from("config.toml"), None, true).unwrap();
    assert_eq!(session.server.as_str(), "http://127.0.0.1:8080/");
    assert!(session.quiet);
}

#[test]
fn test_session_rejects_bad_settings_server() {
    let mut settings = Settings::default();
    settings.server.url = "::nope::".to_string();
    assert!(Session::resolve(settings, PathBuf::from("config.toml"), None, false).is_err());
}

#[test]
fn test_node_row_shows_fields() {
    plain();
    let mut node = Node::new(7, "US 07");
    node.ip = "1.2.3.4".into();
    node.risk = "35%".into();
    node.status = "done".to_string();

    let row = format_node_row(&node, true);
    assert!(row.starts_with('✓'));
    assert!(row.contains("US 07"));
    assert!(row.contains("1.2.3.4"));
    assert!(row.contains("35%"));
    assert!(row.contains("done"));
}

#[test]
fn test_node_row_shows_error() {
    plain();
    let mut node = Node::new(7, "US 07");
    node.error = Some("timeout".to_string());

    let row = format_node_row(&node, false);
    assert!(row.contains("error: timeout"));
}

#[test]
fn test_node_table_summary() {
    plain();
    let mut state = AppState::new();
    state.reset_nodes(vec![Node::new(0, "HK 01"), Node::new(1, "JP 02")]);
    state.toggle_selected(NodeId(1));

    let table = format_node_table(&state);
    assert!(table.contains("NAME"));
    assert!(table.contains("HK 01"));
    assert!(table.contains("JP 02"));
    assert!(table.contains("2 nodes, 1 selected"));
}
