// Tests for the run controller against a scripted backend

use nodewatch_client::{
    CheckConfig, ClientError, EventStream, ExportDocument, Node, NodeId, NodesSnapshot,
    StartOutcome, StreamEvent, StreamItem, Validation, event_channel,
};
use nodewatch_core::{
    Backend, BackendResult, ClipboardSink, ControllerError, Pumped, RECHECK_PLACEHOLDER,
    RECONNECT_DELAY, RunController, RunState, STOPPED_LABEL,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

// ============================================================================
// Scripted Backend
// ============================================================================

#[derive(Default)]
struct Script {
    validate: VecDeque<BackendResult<Validation>>,
    start: VecDeque<BackendResult<StartOutcome>>,
    nodes: VecDeque<BackendResult<NodesSnapshot>>,
    streams: VecDeque<BackendResult<EventStream>>,
    /// How long each successive `open_progress` takes before answering.
    progress_delays: VecDeque<Duration>,
    stop: VecDeque<BackendResult<()>>,
    recheck: VecDeque<BackendResult<Node>>,
    recheck_hangs: bool,
    rename: VecDeque<BackendResult<()>>,
    delete: VecDeque<BackendResult<()>>,
    export: VecDeque<BackendResult<ExportDocument>>,
    calls: Vec<String>,
    exported_ids: Vec<NodeId>,
}

#[derive(Clone, Default)]
struct FakeBackend {
    script: Arc<Mutex<Script>>,
}

impl FakeBackend {
    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap();
        f(&mut script)
    }

    fn record(&self, call: &str) {
        self.with(|s| s.calls.push(call.to_string()));
    }

    fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    fn count(&self, call: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| c.as_str() == call).count())
    }

    /// Queue a progress feed and return the sender that drives it.
    fn push_stream(&self) -> UnboundedSender<StreamItem> {
        let (tx, rx) = event_channel();
        self.with(|s| s.streams.push_back(Ok(EventStream::from_channel(rx))));
        tx
    }
}

fn not_scripted(call: &str) -> ClientError {
    ClientError::Connection(format!("{} not scripted", call))
}

impl Backend for FakeBackend {
    async fn validate(&self, _source: &str) -> BackendResult<Validation> {
        self.record("validate");
        self.with(|s| s.validate.pop_front()).unwrap_or(Ok(Validation {
            valid: true,
            error: None,
            node_count: None,
        }))
    }

    async fn start(&self, _source: &str, _config: &CheckConfig) -> BackendResult<StartOutcome> {
        self.record("start");
        self.with(|s| s.start.pop_front())
            .unwrap_or(Ok(StartOutcome::Started { total: 0 }))
    }

    async fn nodes(&self) -> BackendResult<NodesSnapshot> {
        self.record("nodes");
        self.with(|s| s.nodes.pop_front())
            .unwrap_or(Ok(NodesSnapshot::default()))
    }

    async fn open_progress(&self) -> BackendResult<EventStream> {
        self.record("progress");
        if let Some(delay) = self.with(|s| s.progress_delays.pop_front()) {
            tokio::time::sleep(delay).await;
        }
        self.with(|s| s.streams.pop_front())
            .unwrap_or_else(|| Err(not_scripted("progress")))
    }

    async fn stop(&self) -> BackendResult<()> {
        self.record("stop");
        self.with(|s| s.stop.pop_front()).unwrap_or(Ok(()))
    }

    async fn recheck(&self, _id: NodeId, _config: &CheckConfig) -> BackendResult<Node> {
        self.record("recheck");
        if self.with(|s| s.recheck_hangs) {
            std::future::pending::<()>().await;
        }
        self.with(|s| s.recheck.pop_front())
            .unwrap_or_else(|| Err(not_scripted("recheck")))
    }

    async fn rename(&self, _id: NodeId, _name: &str) -> BackendResult<()> {
        self.record("rename");
        self.with(|s| s.rename.pop_front()).unwrap_or(Ok(()))
    }

    async fn delete(&self, _id: NodeId) -> BackendResult<()> {
        self.record("delete");
        self.with(|s| s.delete.pop_front()).unwrap_or(Ok(()))
    }

    async fn export(&self, ids: &[NodeId]) -> BackendResult<ExportDocument> {
        self.record("export");
        self.with(|s| {
            s.exported_ids = ids.to_vec();
            s.export.pop_front()
        })
        .unwrap_or_else(|| Err(not_scripted("export")))
    }
}

#[derive(Default)]
struct BufferClipboard {
    text: Option<String>,
}

impl ClipboardSink for BufferClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

fn node(id: u64, name: &str) -> Node {
    Node::new(id, name)
}

fn checked(id: u64, name: &str, risk: &str) -> Node {
    let mut node = Node::new(id, name);
    node.risk = risk.into();
    node.status = "done".to_string();
    node
}

fn event(tx: &UnboundedSender<StreamItem>, event: StreamEvent) {
    tx.send(StreamItem::Event(event)).unwrap();
}

fn controller() -> (FakeBackend, RunController<FakeBackend>) {
    let backend = FakeBackend::default();
    let controller = RunController::new(backend.clone(), CheckConfig::default());
    (backend, controller)
}

/// A controller that has finished a run holding `nodes`.
async fn idle_with(nodes: Vec<Node>) -> (FakeBackend, RunController<FakeBackend>) {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.start.push_back(Ok(StartOutcome::Started { total: nodes.len() }));
        s.nodes.push_back(Ok(NodesSnapshot {
            nodes,
            is_running: true,
        }));
    });
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();
    event(&tx, StreamEvent::Complete { total: None });
    controller.follow().await;
    assert_eq!(controller.run_state(), RunState::Idle);
    (backend, controller)
}

// ============================================================================
// Starting A Run
// ============================================================================

#[tokio::test]
async fn test_start_loads_snapshot_and_selects_all() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.start.push_back(Ok(StartOutcome::Started { total: 2 }));
        s.nodes.push_back(Ok(NodesSnapshot {
            nodes: vec![node(0, "HK 01"), node(1, "JP 02")],
            is_running: true,
        }));
    });
    let _tx = backend.push_stream();

    controller.start_check("proxies: []").await.unwrap();

    assert_eq!(controller.run_state(), RunState::Running);
    assert_eq!(controller.state().progress.total, 2);
    assert_eq!(controller.state().nodes().len(), 2);
    assert_eq!(controller.state().selected_ids(), vec![NodeId(0), NodeId(1)]);
    assert!(controller.has_stream());
    assert_eq!(backend.calls(), vec!["validate", "start", "nodes", "progress"]);
}

#[tokio::test]
async fn test_invalid_source_never_starts() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.validate.push_back(Ok(Validation {
            valid: false,
            error: Some("No proxies found".to_string()),
            node_count: None,
        }))
    });

    let result = controller.start_check("nonsense").await;

    assert!(matches!(result, Err(ControllerError::Invalid(_))));
    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(controller.error_message(), Some("No proxies found"));
    assert_eq!(backend.count("start"), 0);
}

#[tokio::test]
async fn test_validation_transport_failure_returns_to_idle() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.validate
            .push_back(Err(ClientError::Connection("refused".to_string())))
    });

    assert!(controller.start_check("proxies: []").await.is_err());
    assert_eq!(controller.run_state(), RunState::Idle);
    let banner = controller.error_message().unwrap();
    assert!(banner.starts_with("Request failed"));
    assert!(banner.contains("refused"));
}

#[tokio::test]
async fn test_start_while_busy_sends_nothing() {
    let (backend, mut controller) = controller();
    let _tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();
    let before = backend.calls().len();

    let result = controller.start_check("proxies: []").await;

    assert!(matches!(result, Err(ControllerError::Busy(_))));
    assert_eq!(backend.calls().len(), before);
}

#[tokio::test]
async fn test_already_running_attaches_to_stream() {
    let (backend, mut controller) = controller();
    backend.with(|s| s.start.push_back(Ok(StartOutcome::AlreadyRunning)));
    let tx = backend.push_stream();

    controller.start_check("proxies: []").await.unwrap();

    assert_eq!(controller.run_state(), RunState::Running);
    assert_eq!(backend.count("nodes"), 0);
    assert!(controller.error_message().is_none());

    event(
        &tx,
        StreamEvent::Progress {
            progress: 1,
            total: Some(3),
            node: Some(node(7, "US 07")),
        },
    );
    assert_eq!(controller.pump().await, Pumped::Applied);
    assert_eq!(controller.state().nodes().len(), 1);
}

#[tokio::test]
async fn test_start_rejection_flashes_error() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.start.push_back(Err(ClientError::Rejected {
            status: 400,
            detail: "Clash API unreachable".to_string(),
        }))
    });

    assert!(controller.start_check("proxies: []").await.is_err());
    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(controller.error_message(), Some("Clash API unreachable"));
    assert_eq!(backend.count("progress"), 0);
}

#[tokio::test]
async fn test_failed_snapshot_still_follows_stream() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.start.push_back(Ok(StartOutcome::Started { total: 1 }));
        s.nodes
            .push_back(Err(ClientError::Connection("reset".to_string())));
    });
    let tx = backend.push_stream();

    controller.start_check("proxies: []").await.unwrap();
    assert!(controller.state().nodes().is_empty());
    assert_eq!(controller.run_state(), RunState::Running);

    event(
        &tx,
        StreamEvent::Progress {
            progress: 1,
            total: None,
            node: Some(checked(0, "HK 01", "12%")),
        },
    );
    event(&tx, StreamEvent::Complete { total: Some(1) });
    controller.follow().await;

    assert_eq!(controller.state().nodes().len(), 1);
    assert!(controller.state().is_selected(NodeId(0)));
}

#[tokio::test]
async fn test_config_locked_while_running() {
    let (backend, mut controller) = controller();
    let _tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    let config = CheckConfig {
        fast_mode: false,
        ..CheckConfig::default()
    };
    assert!(controller.set_config(config.clone()).is_err());
    assert!(controller.config().fast_mode);

    controller.stop_check().await;
    controller.set_config(config).unwrap();
    assert!(!controller.config().fast_mode);
}

// ============================================================================
// Following The Feed
// ============================================================================

#[tokio::test]
async fn test_feed_updates_replace_records_in_order() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.start.push_back(Ok(StartOutcome::Started { total: 2 }));
        s.nodes.push_back(Ok(NodesSnapshot {
            nodes: vec![node(0, "HK 01"), node(1, "JP 02")],
            is_running: true,
        }));
    });
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    event(
        &tx,
        StreamEvent::Progress {
            progress: 1,
            total: Some(2),
            node: Some(checked(0, "HK 01 ⚪", "5%")),
        },
    );
    event(
        &tx,
        StreamEvent::Update {
            node: checked(0, "HK 01 🟢", "20%"),
        },
    );
    event(
        &tx,
        StreamEvent::Update {
            node: checked(42, "ghost", "1%"),
        },
    );

    assert_eq!(controller.drain().await, 3);

    let state = controller.state();
    assert_eq!(state.node(NodeId(0)).unwrap().name, "HK 01 🟢");
    assert_eq!(state.node(NodeId(0)).unwrap().risk.as_str(), "20%");
    assert!(state.node(NodeId(42)).is_none());
    assert_eq!(state.progress.done, 1);
    assert_eq!(state.progress.current, "HK 01 ⚪");
    assert!(state.check_invariants());
}

#[tokio::test]
async fn test_stopped_event_closes_feed() {
    let (backend, mut controller) = controller();
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    event(&tx, StreamEvent::Stopped);
    assert_eq!(controller.pump().await, Pumped::Finished);

    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(controller.state().progress.current, STOPPED_LABEL);
    assert!(!controller.has_stream());
    assert!(tx.send(StreamItem::Event(StreamEvent::Stopped)).is_err());
}

#[tokio::test]
async fn test_node_error_event_keeps_feed_open() {
    let (backend, mut controller) = controller();
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    event(
        &tx,
        StreamEvent::Error {
            node_name: Some("HK 01".to_string()),
            error: Some("timeout".to_string()),
        },
    );
    assert_eq!(controller.pump().await, Pumped::Applied);
    assert!(controller.has_stream());
    assert_eq!(controller.run_state(), RunState::Running);
    assert!(
        controller
            .state()
            .notices
            .last()
            .unwrap()
            .message
            .contains("timeout")
    );
}

#[tokio::test(start_paused = true)]
async fn test_lost_feed_reconnects_while_running() {
    let (backend, mut controller) = controller();
    let first = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    let second = backend.push_stream();
    drop(first);

    assert_eq!(controller.pump().await, Pumped::Lost);
    assert!(controller.is_following());
    assert!(!controller.has_stream());

    let before = tokio::time::Instant::now();
    event(&second, StreamEvent::Complete { total: Some(0) });
    assert_eq!(controller.pump().await, Pumped::Finished);

    assert!(tokio::time::Instant::now() - before >= RECONNECT_DELAY);
    assert_eq!(backend.count("progress"), 2);
    assert_eq!(controller.run_state(), RunState::Idle);
    assert!(!controller.is_following());
}

#[tokio::test(start_paused = true)]
async fn test_slow_reopen_survives_short_pump_budgets() {
    let (backend, mut controller) = controller();
    let first = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    backend.with(|s| s.progress_delays.push_back(Duration::from_millis(400)));
    let second = backend.push_stream();
    drop(first);
    assert_eq!(controller.pump().await, Pumped::Lost);
    event(&second, StreamEvent::Complete { total: Some(0) });

    // Follow the way `check` does, giving each pump less time than the
    // slow reopen needs.
    let mut rounds = 0;
    while controller.is_following() {
        rounds += 1;
        assert!(rounds < 100, "follow loop never finished");
        let _ = tokio::time::timeout(Duration::from_millis(250), controller.pump()).await;
        if controller.run_state() == RunState::Running {
            assert!(controller.is_following());
        }
    }

    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(backend.count("progress"), 3);
}

#[tokio::test]
async fn test_lost_feed_after_stop_is_not_reopened() {
    let (backend, mut controller) = controller();
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    controller.stop_check().await;
    assert_eq!(controller.run_state(), RunState::Idle);
    drop(tx);

    assert_eq!(controller.pump().await, Pumped::Lost);
    assert!(!controller.is_following());
    assert_eq!(backend.count("progress"), 1);
}

#[tokio::test]
async fn test_late_stopped_after_local_stop_is_harmless() {
    let (backend, mut controller) = controller();
    let tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    controller.stop_check().await;
    event(&tx, StreamEvent::Stopped);
    controller.follow().await;

    assert_eq!(controller.run_state(), RunState::Idle);
    assert_eq!(backend.count("stop"), 1);
}

#[tokio::test]
async fn test_failed_stop_request_still_goes_idle() {
    let (backend, mut controller) = controller();
    let _tx = backend.push_stream();
    backend.with(|s| {
        s.stop
            .push_back(Err(ClientError::Connection("refused".to_string())))
    });
    controller.start_check("proxies: []").await.unwrap();

    controller.stop_check().await;

    assert_eq!(controller.run_state(), RunState::Idle);
    assert!(
        controller
            .state()
            .notices
            .last()
            .unwrap()
            .message
            .starts_with("Stop request failed")
    );
}

// ============================================================================
// Recheck
// ============================================================================

#[tokio::test]
async fn test_recheck_replaces_node() {
    let (backend, mut controller) = idle_with(vec![node(3, "SG 03")]).await;
    backend.with(|s| s.recheck.push_back(Ok(checked(3, "SG 03 🟡", "45%"))));

    controller.recheck_node(NodeId(3)).await.unwrap();

    let node = controller.state().node(NodeId(3)).unwrap();
    assert_eq!(node.name, "SG 03 🟡");
    assert_eq!(node.risk.as_str(), "45%");
    assert!(!controller.state().recheck_lock);
}

#[tokio::test]
async fn test_recheck_failure_restores_name() {
    let (backend, mut controller) = idle_with(vec![node(3, "SG 03")]).await;
    backend.with(|s| {
        s.recheck.push_back(Err(ClientError::Rejected {
            status: 500,
            detail: "proxy not found".to_string(),
        }))
    });

    assert!(controller.recheck_node(NodeId(3)).await.is_err());

    assert_eq!(controller.state().node(NodeId(3)).unwrap().name, "SG 03");
    assert!(!controller.state().recheck_lock);
    assert!(controller.error_message().unwrap().contains("proxy not found"));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_recheck_restores_name() {
    let (backend, mut controller) = idle_with(vec![node(3, "SG 03")]).await;
    backend.with(|s| s.recheck_hangs = true);

    let outcome =
        tokio::time::timeout(Duration::from_secs(5), controller.recheck_node(NodeId(3))).await;

    assert!(outcome.is_err());
    assert_eq!(controller.state().node(NodeId(3)).unwrap().name, "SG 03");
    assert!(!controller.state().recheck_lock);
}

#[tokio::test]
async fn test_recheck_refused_while_running() {
    let (backend, mut controller) = controller();
    backend.with(|s| {
        s.nodes.push_back(Ok(NodesSnapshot {
            nodes: vec![node(3, "SG 03")],
            is_running: true,
        }))
    });
    let _tx = backend.push_stream();
    controller.start_check("proxies: []").await.unwrap();

    let result = controller.recheck_node(NodeId(3)).await;

    assert!(matches!(result, Err(ControllerError::Busy(_))));
    assert_eq!(backend.count("recheck"), 0);
    assert_ne!(
        controller.state().node(NodeId(3)).unwrap().name,
        RECHECK_PLACEHOLDER
    );
}

#[tokio::test]
async fn test_recheck_unknown_node() {
    let (backend, mut controller) = idle_with(vec![node(3, "SG 03")]).await;

    let result = controller.recheck_node(NodeId(9)).await;

    assert!(matches!(result, Err(ControllerError::UnknownNode(NodeId(9)))));
    assert_eq!(backend.count("recheck"), 0);
}

// ============================================================================
// Rename
// ============================================================================

#[tokio::test]
async fn test_save_edit_renames_node() {
    let (backend, mut controller) = idle_with(vec![node(1, "JP 02")]).await;

    controller.start_edit(NodeId(1)).unwrap();
    *controller.edit_draft_mut().unwrap() = "Tokyo 02".to_string();
    assert!(controller.save_edit().await.unwrap());

    assert_eq!(controller.state().node(NodeId(1)).unwrap().name, "Tokyo 02");
    assert!(!controller.state().edit.is_editing(NodeId(1)));
    assert_eq!(backend.count("rename"), 1);
}

#[tokio::test]
async fn test_blank_or_unchanged_draft_sends_nothing() {
    let (backend, mut controller) = idle_with(vec![node(1, "JP 02")]).await;

    controller.start_edit(NodeId(1)).unwrap();
    *controller.edit_draft_mut().unwrap() = "   ".to_string();
    assert!(!controller.save_edit().await.unwrap());

    controller.start_edit(NodeId(1)).unwrap();
    assert!(!controller.save_edit().await.unwrap());

    assert_eq!(backend.count("rename"), 0);
    assert_eq!(controller.state().node(NodeId(1)).unwrap().name, "JP 02");
}

#[tokio::test]
async fn test_failed_rename_keeps_old_name() {
    let (backend, mut controller) = idle_with(vec![node(1, "JP 02")]).await;
    backend.with(|s| {
        s.rename.push_back(Err(ClientError::Rejected {
            status: 404,
            detail: "Node not found".to_string(),
        }))
    });

    controller.start_edit(NodeId(1)).unwrap();
    *controller.edit_draft_mut().unwrap() = "Tokyo".to_string();
    assert!(controller.save_edit().await.is_err());

    assert_eq!(controller.state().node(NodeId(1)).unwrap().name, "JP 02");
    assert!(controller.state().edit.editing_id().is_none());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_asks_then_removes() {
    let (backend, mut controller) = idle_with(vec![node(0, "HK 01"), node(1, "JP 02")]).await;
    let mut asked = Vec::new();

    controller
        .delete_node(NodeId(1), &mut |prompt: &str| {
            asked.push(prompt.to_string());
            true
        })
        .await
        .unwrap();

    assert_eq!(asked, vec!["Delete node \"JP 02\"?"]);
    assert!(controller.state().node(NodeId(1)).is_none());
    assert!(!controller.state().is_selected(NodeId(1)));
    assert_eq!(backend.count("delete"), 1);
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let (backend, mut controller) = idle_with(vec![node(0, "HK 01")]).await;

    let result = controller.delete_node(NodeId(0), &mut |_: &str| false).await;

    assert!(matches!(result, Err(ControllerError::Cancelled)));
    assert_eq!(backend.count("delete"), 0);
    assert!(controller.state().node(NodeId(0)).is_some());
}

#[tokio::test]
async fn test_delete_of_remotely_missing_node_still_removes() {
    let (backend, mut controller) = idle_with(vec![node(0, "HK 01")]).await;
    backend.with(|s| {
        s.delete.push_back(Err(ClientError::Rejected {
            status: 404,
            detail: "Node not found".to_string(),
        }))
    });

    controller.delete_node(NodeId(0), &mut |_: &str| true).await.unwrap();
    assert!(controller.state().nodes().is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_node() {
    let (backend, mut controller) = idle_with(vec![node(0, "HK 01")]).await;
    backend.with(|s| {
        s.delete
            .push_back(Err(ClientError::Connection("refused".to_string())))
    });

    assert!(controller.delete_node(NodeId(0), &mut |_: &str| true).await.is_err());
    assert!(controller.state().node(NodeId(0)).is_some());
    assert!(controller.state().is_selected(NodeId(0)));
}

// ============================================================================
// Selection And Export
// ============================================================================

#[tokio::test]
async fn test_export_sends_selection_in_list_order() {
    let (backend, mut controller) =
        idle_with(vec![node(0, "HK 01"), node(1, "JP 02"), node(2, "US 03")]).await;
    backend.with(|s| {
        s.export.push_back(Ok(ExportDocument {
            yaml: "proxies: []\n".to_string(),
            filename: "nodes_checked.yaml".to_string(),
            url: "/download/nodes_checked.yaml".to_string(),
        }))
    });

    controller.toggle_selected(NodeId(1));
    let session = controller.export().await.unwrap();
    assert_eq!(session.filename, "nodes_checked.yaml");

    assert_eq!(backend.with(|s| s.exported_ids.clone()), vec![NodeId(0), NodeId(2)]);

    let mut clipboard = BufferClipboard::default();
    controller.copy_export(&mut clipboard).unwrap();
    assert_eq!(clipboard.text.as_deref(), Some("proxies: []\n"));
}

#[tokio::test]
async fn test_export_with_empty_selection_sends_nothing() {
    let (backend, mut controller) = idle_with(vec![node(0, "HK 01")]).await;
    controller.select_none();

    let result = controller.export().await;

    assert!(matches!(result, Err(ControllerError::EmptySelection)));
    assert_eq!(backend.count("export"), 0);
}

#[tokio::test]
async fn test_import_link_needs_an_export() {
    let (_backend, mut controller) = idle_with(vec![node(0, "HK 01")]).await;
    let server = url::Url::parse("http://127.0.0.1:8080").unwrap();

    assert!(controller.import_link(&server).is_none());
    assert!(controller.copy_export(&mut BufferClipboard::default()).is_err());
}

#[tokio::test]
async fn test_toggle_all_round_trip() {
    let (_backend, mut controller) = idle_with(vec![node(0, "HK 01"), node(1, "JP 02")]).await;

    controller.toggle_all(false);
    assert!(controller.state().selected_ids().is_empty());

    controller.toggle_all(true);
    assert_eq!(controller.state().selected_ids().len(), 2);
    assert_eq!(controller.toggle_selected(NodeId(5)), None);
}
