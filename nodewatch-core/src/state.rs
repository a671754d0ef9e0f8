use crate::edit::EditSession;
use crate::export::ExportSession;
use crate::notice::{ErrorBanner, Notices};
use crate::store::{NodeStore, SelectionSet};
use nodewatch_client::{Node, NodeId};

/// Label shown in place of the current node once a run has been stopped.
pub const STOPPED_LABEL: &str = "Stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Validating,
    Starting,
    Running,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Validating => "validating",
            RunState::Starting => "starting",
            RunState::Running => "running",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// What the service is working on right now, or the stopped label.
    pub current: String,
}

/// Everything the controller owns, with one mutation API for nodes so the
/// selection can never point at a node that is gone.
#[derive(Debug, Default)]
pub struct AppState {
    nodes: NodeStore,
    selection: SelectionSet,
    pub run: RunState,
    pub recheck_lock: bool,
    pub edit: EditSession,
    pub progress: Progress,
    pub banner: ErrorBanner,
    pub notices: Notices,
    pub export: Option<ExportSession>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.selection.ordered(&self.nodes)
    }

    /// Drop the current list for `nodes`, selecting all of them.
    pub fn reset_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes.reset(nodes);
        self.selection.fill(self.nodes.ids());
        if let Some(id) = self.edit.editing_id()
            && !self.nodes.contains(id)
        {
            self.edit.cancel();
        }
    }

    /// Replace in place, or append and select a node seen for the first time.
    pub fn upsert_node(&mut self, node: Node) -> bool {
        let id = node.id;
        let inserted = self.nodes.upsert(node);
        if inserted {
            self.selection.insert(id);
        }
        inserted
    }

    /// Replace in place only; unknown ids are ignored.
    pub fn replace_node(&mut self, node: Node) -> bool {
        self.nodes.replace(node)
    }

    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove a node and its selection together.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let removed = self.nodes.remove(id)?;
        self.selection.remove(id);
        if self.edit.is_editing(id) {
            self.edit.cancel();
        }
        Some(removed)
    }

    pub fn select_all(&mut self) {
        self.selection.fill(self.nodes.ids());
    }

    pub fn select_none(&mut self) {
        self.selection.clear();
    }

    pub fn toggle_all(&mut self, checked: bool) {
        if checked {
            self.select_all();
        } else {
            self.select_none();
        }
    }

    /// Flip one row. Returns the new selected state, or `None` for an id
    /// that is not in the store.
    pub fn toggle_selected(&mut self, id: NodeId) -> Option<bool> {
        if !self.nodes.contains(id) {
            return None;
        }
        if self.selection.contains(id) {
            self.selection.remove(id);
            Some(false)
        } else {
            self.selection.insert(id);
            Some(true)
        }
    }

    pub fn is_busy(&self) -> bool {
        self.run != RunState::Idle
    }

    pub fn can_recheck(&self) -> bool {
        self.run != RunState::Running && !self.recheck_lock
    }

    pub fn check_invariants(&self) -> bool {
        self.selection.is_subset_of(&self.nodes)
    }
}
