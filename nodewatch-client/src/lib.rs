pub mod api;
pub mod error;
pub mod model;
pub mod stream;

pub use api::ApiClient;
pub use error::ClientError;
pub use model::{
    CheckConfig, ExportDocument, FieldValue, Node, NodeId, NodesSnapshot, Source, StartOutcome,
    StreamEvent, Validation,
};
pub use stream::{EventStream, SseDecoder, StreamItem, event_channel};
