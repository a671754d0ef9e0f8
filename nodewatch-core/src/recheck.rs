use crate::error::{ControllerError, Result};
use crate::state::AppState;
use nodewatch_client::{Node, NodeId};

/// Name shown while a single-node recheck is in flight.
pub const RECHECK_PLACEHOLDER: &str = "⏳ Checking...";

/// Holds the recheck lock and the placeholder name for one request.
///
/// Committing swaps in the fresh record. Any other way out (error return,
/// early `?`, the request future being dropped) restores the previous name.
/// The lock is released either way.
pub struct RecheckTxn<'a> {
    state: &'a mut AppState,
    id: NodeId,
    previous_name: String,
    committed: bool,
}

impl<'a> RecheckTxn<'a> {
    pub fn begin(state: &'a mut AppState, id: NodeId) -> Result<Self> {
        if state.recheck_lock {
            return Err(ControllerError::RecheckInFlight);
        }
        let previous_name = state
            .node(id)
            .map(|n| n.name.clone())
            .ok_or(ControllerError::UnknownNode(id))?;

        state.recheck_lock = true;
        state.rename_node(id, RECHECK_PLACEHOLDER);

        Ok(Self {
            state,
            id,
            previous_name,
            committed: false,
        })
    }

    pub fn commit(mut self, node: Node) {
        if !self.state.replace_node(node) {
            // The fresh record is for a node we no longer hold; put the
            // placeholder back the way it was.
            self.state.rename_node(self.id, self.previous_name.clone());
        }
        self.committed = true;
    }
}

impl Drop for RecheckTxn<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.state
                .rename_node(self.id, std::mem::take(&mut self.previous_name));
        }
        self.state.recheck_lock = false;
    }
}
