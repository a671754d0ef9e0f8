use crate::export::ExportError;
use crate::state::RunState;
use nodewatch_client::{ClientError, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    /// The action is disabled in the current state; nothing was sent.
    #[error("Busy: a check is {0}")]
    Busy(&'static str),

    #[error("A recheck is already in flight")]
    RecheckInFlight,

    #[error("Invalid node list: {0}")]
    Invalid(String),

    #[error("Node {0} not found")]
    UnknownNode(NodeId),

    #[error("No nodes selected for export")]
    EmptySelection,

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ControllerError {
    pub(crate) fn busy(run: RunState) -> Self {
        ControllerError::Busy(run.as_str())
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
