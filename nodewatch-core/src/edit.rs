use nodewatch_client::{Node, NodeId};

/// Inline rename state. At most one node is edited at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    None,
    Editing {
        id: NodeId,
        draft: String,
        focus_pending: bool,
    },
}

impl EditSession {
    /// Begin editing `node`. An edit already in progress is dropped without
    /// saving; its id is returned.
    pub fn begin(&mut self, node: &Node) -> Option<NodeId> {
        let abandoned = self.editing_id().filter(|id| *id != node.id);
        *self = EditSession::Editing {
            id: node.id,
            draft: node.name.clone(),
            focus_pending: true,
        };
        abandoned
    }

    pub fn editing_id(&self) -> Option<NodeId> {
        match self {
            EditSession::Editing { id, .. } => Some(*id),
            EditSession::None => None,
        }
    }

    pub fn is_editing(&self, id: NodeId) -> bool {
        self.editing_id() == Some(id)
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Editing { draft, .. } => Some(draft.as_str()),
            EditSession::None => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut String> {
        match self {
            EditSession::Editing { draft, .. } => Some(draft),
            EditSession::None => None,
        }
    }

    /// Returns true once after `begin`, for whoever owns the input widget.
    pub fn take_focus_request(&mut self) -> bool {
        match self {
            EditSession::Editing { focus_pending, .. } => std::mem::take(focus_pending),
            EditSession::None => false,
        }
    }

    /// The name worth sending for `current_name`, if any: blank drafts and
    /// unchanged drafts yield nothing.
    pub fn candidate(&self, current_name: &str) -> Option<String> {
        let draft = self.draft()?;
        if draft.trim().is_empty() || draft == current_name {
            return None;
        }
        Some(draft.to_string())
    }

    pub fn cancel(&mut self) {
        *self = EditSession::None;
    }
}
