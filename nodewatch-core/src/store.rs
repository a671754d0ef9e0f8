use nodewatch_client::{Node, NodeId};
use std::collections::HashSet;

/// Ordered node list keyed by id. Position is first-seen order and is kept
/// across in-place replacement.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Replace the record with the same id, keeping its position. Returns
    /// false (and changes nothing) if the id is unknown.
    pub fn replace(&mut self, node: Node) -> bool {
        match self.position(node.id) {
            Some(idx) => {
                self.nodes[idx] = node;
                true
            }
            None => false,
        }
    }

    /// Replace in place or append. Returns true when the node was new.
    pub fn upsert(&mut self, node: Node) -> bool {
        match self.position(node.id) {
            Some(idx) => {
                self.nodes[idx] = node;
                false
            }
            None => {
                self.nodes.push(node);
                true
            }
        }
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.position(id)?;
        Some(self.nodes.remove(idx))
    }

    /// Swap in a whole new list. Duplicate ids keep only their last record,
    /// at the first position they appeared.
    pub fn reset(&mut self, nodes: Vec<Node>) {
        self.nodes.clear();
        for node in nodes {
            self.upsert(node);
        }
    }
}

/// Ids chosen for export. Only ever holds ids present in the owning store;
/// `AppState` is the one place that mutates both together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub(crate) fn insert(&mut self, id: NodeId) -> bool {
        self.ids.insert(id)
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        self.ids.remove(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
    }

    pub(crate) fn fill(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids = ids.into_iter().collect();
    }

    /// Selected ids in store order.
    pub fn ordered(&self, store: &NodeStore) -> Vec<NodeId> {
        store.ids().filter(|id| self.ids.contains(id)).collect()
    }

    pub fn is_subset_of(&self, store: &NodeStore) -> bool {
        self.ids.iter().all(|id| store.contains(*id))
    }
}
