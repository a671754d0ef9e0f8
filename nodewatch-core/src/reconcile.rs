// Merges progress-feed events into the application state

use crate::state::{AppState, RunState, STOPPED_LABEL};
use nodewatch_client::StreamEvent;
use tracing::debug;

/// What the caller should do with the connection after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    /// A terminal event arrived; the connection has nothing left to say.
    Close,
}

pub struct StreamReconciler;

impl StreamReconciler {
    /// Apply one event. Events are taken strictly in arrival order and every
    /// node mutation is a whole-record replace, so duplicates are harmless.
    pub fn apply(state: &mut AppState, event: StreamEvent) -> Disposition {
        let disposition = if event.is_terminal() {
            Disposition::Close
        } else {
            Disposition::Continue
        };

        match event {
            StreamEvent::Progress {
                progress,
                total,
                node,
            } => {
                state.progress.done = progress;
                if let Some(total) = total {
                    state.progress.total = total;
                }
                state.progress.current = node
                    .as_ref()
                    .map(|n| n.original_name.clone())
                    .unwrap_or_default();

                if let Some(node) = node {
                    let id = node.id;
                    if state.upsert_node(node) {
                        debug!("Node {} first seen on the progress feed", id);
                    }
                }
            }
            StreamEvent::Update { node } => {
                let id = node.id;
                if !state.replace_node(node) {
                    debug!("Ignoring update for unknown node {}", id);
                }
            }
            StreamEvent::Complete { total } => {
                state.run = RunState::Idle;
                state.progress.current.clear();
                let summary = match total {
                    Some(total) => format!("Check complete: {} nodes", total),
                    None => "Check complete".to_string(),
                };
                state.notices.info(summary);
            }
            StreamEvent::Stopped => {
                state.run = RunState::Idle;
                state.progress.current = STOPPED_LABEL.to_string();
            }
            StreamEvent::Error { node_name, error } => {
                state.notices.warn(format!(
                    "Node error: {}: {}",
                    node_name.as_deref().unwrap_or("unknown"),
                    error.as_deref().unwrap_or("no details")
                ));
            }
        }
        disposition
    }
}
