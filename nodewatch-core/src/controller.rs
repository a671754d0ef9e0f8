use crate::backend::Backend;
use crate::error::{ControllerError, Result};
use crate::export::{ClipboardSink, ExportError, ExportSession};
use crate::reconcile::{Disposition, StreamReconciler};
use crate::recheck::RecheckTxn;
use crate::state::{AppState, Progress, RunState};
use nodewatch_client::{CheckConfig, ClientError, EventStream, NodeId, StartOutcome, StreamItem};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Wait before re-opening a progress feed that dropped mid-run.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Asked before a delete goes out; receives the prompt text.
pub type ConfirmCallback<'a> = &'a mut dyn FnMut(&str) -> bool;

/// What a single [`RunController::pump`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pumped {
    /// An event was reconciled and the feed stays open.
    Applied,
    /// A terminal event closed the feed.
    Finished,
    /// The feed dropped. A reconnect is scheduled if a run is still live.
    Lost,
    /// Nothing to wait on.
    Idle,
}

/// Drives check runs against a [`Backend`] and owns the state they produce.
///
/// Every operation takes `&mut self`, so no two of them interleave; the
/// run-state and recheck-lock checks reject actions that the front end
/// should have disabled.
pub struct RunController<B: Backend> {
    backend: B,
    config: CheckConfig,
    state: AppState,
    stream: Option<EventStream>,
    reconnect_at: Option<tokio::time::Instant>,
}

impl<B: Backend> RunController<B> {
    pub fn new(backend: B, config: CheckConfig) -> Self {
        Self {
            backend,
            config,
            state: AppState::new(),
            stream: None,
            reconnect_at: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Swap the options used by the next start or recheck.
    pub fn set_config(&mut self, config: CheckConfig) -> Result<()> {
        if self.state.is_busy() {
            return Err(ControllerError::busy(self.state.run));
        }
        self.config = config;
        Ok(())
    }

    pub fn run_state(&self) -> RunState {
        self.state.run
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// True while there is a feed to read or one is about to be re-opened.
    pub fn is_following(&self) -> bool {
        self.stream.is_some() || self.reconnect_at.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.banner.visible(Instant::now())
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    /// Validate `source`, start a run with the current options and attach to
    /// its progress feed. A service that is already running a check is
    /// attached to instead of reported as an error.
    pub async fn start_check(&mut self, source: &str) -> Result<()> {
        if self.state.is_busy() {
            debug!("Ignoring start while {}", self.state.run.as_str());
            return Err(ControllerError::busy(self.state.run));
        }

        self.state.banner.clear();
        self.state.progress.done = 0;
        self.state.run = RunState::Validating;

        let validation = match self.backend.validate(source).await {
            Ok(validation) => validation,
            Err(e) => return Err(self.abort_start(e)),
        };
        if !validation.valid {
            let message = validation
                .error
                .unwrap_or_else(|| "Invalid node list".to_string());
            self.state.banner.set(message.clone());
            self.state.run = RunState::Idle;
            return Err(ControllerError::Invalid(message));
        }

        self.state.run = RunState::Starting;
        match self.backend.start(source, &self.config).await {
            Ok(StartOutcome::AlreadyRunning) => {
                self.state.run = RunState::Running;
                self.state
                    .notices
                    .info("A check is already running, following it");
                self.open_stream().await;
                Ok(())
            }
            Ok(StartOutcome::Started { total }) => {
                self.state.progress = Progress {
                    done: 0,
                    total,
                    current: String::new(),
                };
                self.state.run = RunState::Running;
                info!("Check started for {} nodes", total);

                // The feed repopulates the list, so a failed snapshot only
                // costs the pending rows.
                let nodes = match self.backend.nodes().await {
                    Ok(snapshot) => snapshot.nodes,
                    Err(e) => {
                        self.state
                            .notices
                            .warn(format!("Initial node fetch failed: {}", e));
                        Vec::new()
                    }
                };
                self.state.reset_nodes(nodes);
                self.state.export = None;

                self.open_stream().await;
                Ok(())
            }
            Err(e) => Err(self.abort_start(e)),
        }
    }

    fn abort_start(&mut self, e: ClientError) -> ControllerError {
        match &e {
            ClientError::Rejected { detail, .. } => {
                self.state.banner.flash(detail.clone(), Instant::now());
            }
            transport if transport.is_transport() => {
                self.state
                    .banner
                    .set(format!("Request failed: {}", transport));
            }
            other => self.state.banner.set(other.to_string()),
        }
        warn!("Start failed: {}", e);
        self.state.run = RunState::Idle;
        ControllerError::Client(e)
    }

    /// Ask the service to stop. Local state goes idle straight away; the
    /// feed stays open so a late `stopped` can confirm it.
    pub async fn stop_check(&mut self) {
        self.state.run = RunState::Idle;
        self.reconnect_at = None;

        if let Err(e) = self.backend.stop().await {
            self.state
                .notices
                .warn(format!("Stop request failed: {}", e));
        }
    }

    async fn open_stream(&mut self) {
        self.close_stream();

        match self.backend.open_progress().await {
            Ok(stream) => {
                debug!("Progress feed attached");
                self.stream = Some(stream);
                self.reconnect_at = None;
            }
            Err(e) => self.stream_lost(&e.to_string()),
        }
    }

    fn close_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }

    fn stream_lost(&mut self, reason: &str) {
        self.close_stream();
        if self.state.run == RunState::Running {
            self.state.notices.warn(format!(
                "Progress feed lost ({}), reconnecting in {}s",
                reason,
                RECONNECT_DELAY.as_secs()
            ));
            self.reconnect_at = Some(tokio::time::Instant::now() + RECONNECT_DELAY);
        } else {
            debug!("Progress feed ended after the run: {}", reason);
            self.reconnect_at = None;
        }
    }

    fn handle_item(&mut self, item: Option<StreamItem>) -> Pumped {
        match item {
            Some(StreamItem::Event(event)) => {
                match StreamReconciler::apply(&mut self.state, event) {
                    Disposition::Continue => Pumped::Applied,
                    Disposition::Close => {
                        self.close_stream();
                        self.reconnect_at = None;
                        Pumped::Finished
                    }
                }
            }
            Some(StreamItem::TransportError(reason)) => {
                self.stream_lost(&reason);
                Pumped::Lost
            }
            None => {
                self.stream_lost("connection closed");
                Pumped::Lost
            }
        }
    }

    async fn reconnect_if_due(&mut self, wait: bool) {
        let Some(due) = self.reconnect_at else {
            return;
        };
        if self.state.run != RunState::Running {
            self.reconnect_at = None;
            return;
        }
        if !wait && tokio::time::Instant::now() < due {
            return;
        }

        // `reconnect_at` stays set until a feed is attached, so dropping this
        // future part way through leaves the reconnect pending.
        tokio::time::sleep_until(due).await;
        info!("Re-opening progress feed");
        self.open_stream().await;
    }

    /// Wait for the next feed item and reconcile it, re-opening a dropped
    /// feed first if one is due. Cancel-safe: a dropped call loses no event
    /// and no pending reconnect.
    pub async fn pump(&mut self) -> Pumped {
        if self.stream.is_none() {
            self.reconnect_if_due(true).await;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Pumped::Idle;
        };
        let item = stream.next().await;
        self.handle_item(item)
    }

    /// Reconcile every item already queued without waiting. Returns how
    /// many were handled.
    pub async fn drain(&mut self) -> usize {
        if self.stream.is_none() {
            self.reconnect_if_due(false).await;
        }

        let mut handled = 0;
        while let Some(stream) = self.stream.as_mut() {
            let Some(item) = stream.try_next() else {
                break;
            };
            handled += 1;
            self.handle_item(Some(item));
        }
        handled
    }

    /// Pump until the run is over and the feed is closed.
    pub async fn follow(&mut self) {
        while self.is_following() {
            if self.pump().await == Pumped::Idle {
                break;
            }
        }
    }

    /// Load the service's current node list outside a run.
    pub async fn refresh_nodes(&mut self) -> Result<()> {
        if self.state.is_busy() {
            return Err(ControllerError::busy(self.state.run));
        }

        let snapshot = self.backend.nodes().await?;
        if snapshot.is_running {
            self.state
                .notices
                .info("The service is running a check; start to follow it");
        }
        self.state.reset_nodes(snapshot.nodes);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Single-node operations
    // ------------------------------------------------------------------

    /// Re-run the check for one node with the current options.
    pub async fn recheck_node(&mut self, id: NodeId) -> Result<()> {
        if self.state.run == RunState::Running {
            return Err(ControllerError::busy(self.state.run));
        }

        let txn = RecheckTxn::begin(&mut self.state, id)?;
        match self.backend.recheck(id, &self.config).await {
            Ok(node) => {
                txn.commit(node);
                Ok(())
            }
            Err(e) => {
                drop(txn);
                let message = format!("Recheck failed: {}", e);
                self.state.banner.flash(message.clone(), Instant::now());
                self.state.notices.error(message);
                Err(e.into())
            }
        }
    }

    pub fn start_edit(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .state
            .node(id)
            .cloned()
            .ok_or(ControllerError::UnknownNode(id))?;
        if let Some(abandoned) = self.state.edit.begin(&node) {
            debug!("Dropped unsaved edit of node {}", abandoned);
        }
        Ok(())
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut String> {
        self.state.edit.draft_mut()
    }

    /// Send the draft name if it is non-blank and differs from the current
    /// one. The edit ends whatever the outcome; returns whether a rename
    /// was applied.
    pub async fn save_edit(&mut self) -> Result<bool> {
        let Some(id) = self.state.edit.editing_id() else {
            return Ok(false);
        };

        let candidate = self
            .state
            .node(id)
            .and_then(|node| self.state.edit.candidate(&node.name));

        let result = match candidate {
            None => Ok(false),
            Some(name) => match self.backend.rename(id, &name).await {
                Ok(()) => {
                    self.state.rename_node(id, name);
                    Ok(true)
                }
                Err(e) => {
                    self.state.notices.error(format!("Rename failed: {}", e));
                    Err(e.into())
                }
            },
        };

        self.state.edit.cancel();
        result
    }

    pub fn cancel_edit(&mut self) {
        self.state.edit.cancel();
    }

    pub fn delete_prompt(&self, id: NodeId) -> Option<String> {
        self.state
            .node(id)
            .map(|node| format!("Delete node \"{}\"?", node.label()))
    }

    /// Delete after `confirm` agrees. The node leaves the list (and the
    /// selection) only once the service has acknowledged.
    pub async fn delete_node(&mut self, id: NodeId, confirm: ConfirmCallback<'_>) -> Result<()> {
        let prompt = self
            .delete_prompt(id)
            .ok_or(ControllerError::UnknownNode(id))?;
        if !confirm(&prompt) {
            return Err(ControllerError::Cancelled);
        }

        match self.backend.delete(id).await {
            Ok(()) => {}
            // Already gone on the service side.
            Err(ClientError::Rejected { status: 404, .. }) => {
                debug!("Node {} was already deleted remotely", id);
            }
            Err(e) => {
                self.state.notices.error(format!("Delete failed: {}", e));
                return Err(e.into());
            }
        }

        self.state.remove_node(id);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.state.select_all();
    }

    pub fn select_none(&mut self) {
        self.state.select_none();
    }

    pub fn toggle_all(&mut self, checked: bool) {
        self.state.toggle_all(checked);
    }

    pub fn toggle_selected(&mut self, id: NodeId) -> Option<bool> {
        self.state.toggle_selected(id)
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Export the selected nodes. Nothing is sent for an empty selection.
    pub async fn export(&mut self) -> Result<&ExportSession> {
        let ids = self.state.selected_ids();
        if ids.is_empty() {
            self.state
                .notices
                .warn("Select at least one node to export");
            return Err(ControllerError::EmptySelection);
        }

        match self.backend.export(&ids).await {
            Ok(doc) => {
                self.state
                    .notices
                    .info(format!("Exported {} nodes as {}", ids.len(), doc.filename));
                Ok(self.state.export.insert(ExportSession::from(doc)))
            }
            Err(e) => {
                self.state.notices.error(format!("Export failed: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn export_session(&self) -> Option<&ExportSession> {
        self.state.export.as_ref()
    }

    pub fn download_export(&mut self, dir: &Path) -> Result<PathBuf> {
        let session = self
            .state
            .export
            .as_ref()
            .ok_or(ExportError::NothingExported)?;

        match session.download(dir) {
            Ok(path) => {
                self.state
                    .notices
                    .info(format!("Saved {}", path.display()));
                Ok(path)
            }
            Err(e) => {
                self.state.notices.error(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn copy_export(&mut self, clipboard: &mut dyn ClipboardSink) -> Result<()> {
        let session = self
            .state
            .export
            .as_ref()
            .ok_or(ExportError::NothingExported)?;

        match session.copy_to(clipboard) {
            Ok(()) => {
                self.state.notices.info("Copied to clipboard");
                Ok(())
            }
            Err(e) => {
                self.state.notices.error(format!("Copy failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Clash deep link for the last export, or `None` (with a warning) when
    /// nothing has been exported yet.
    pub fn import_link(&mut self, server: &Url) -> Option<String> {
        let Some(session) = self.state.export.as_ref() else {
            self.state.notices.warn("No export link available yet");
            return None;
        };

        match session.import_uri(server) {
            Ok(link) => Some(link),
            Err(e) => {
                self.state.notices.error(e.to_string());
                None
            }
        }
    }
}
