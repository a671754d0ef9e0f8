use nodewatch_client::{
    ApiClient, CheckConfig, ClientError, EventStream, ExportDocument, Node, NodeId, NodesSnapshot,
    StartOutcome, Validation,
};
use std::future::Future;

pub type BackendResult<T> = Result<T, ClientError>;

/// The checker service as the controller sees it. [`ApiClient`] is the real
/// implementation; tests script their own.
pub trait Backend {
    fn validate(&self, source: &str) -> impl Future<Output = BackendResult<Validation>> + Send;

    fn start(
        &self,
        source: &str,
        config: &CheckConfig,
    ) -> impl Future<Output = BackendResult<StartOutcome>> + Send;

    fn nodes(&self) -> impl Future<Output = BackendResult<NodesSnapshot>> + Send;

    fn open_progress(&self) -> impl Future<Output = BackendResult<EventStream>> + Send;

    fn stop(&self) -> impl Future<Output = BackendResult<()>> + Send;

    fn recheck(
        &self,
        id: NodeId,
        config: &CheckConfig,
    ) -> impl Future<Output = BackendResult<Node>> + Send;

    fn rename(&self, id: NodeId, name: &str) -> impl Future<Output = BackendResult<()>> + Send;

    fn delete(&self, id: NodeId) -> impl Future<Output = BackendResult<()>> + Send;

    fn export(&self, ids: &[NodeId]) -> impl Future<Output = BackendResult<ExportDocument>> + Send;
}

impl Backend for ApiClient {
    async fn validate(&self, source: &str) -> BackendResult<Validation> {
        ApiClient::validate(self, source).await
    }

    async fn start(&self, source: &str, config: &CheckConfig) -> BackendResult<StartOutcome> {
        ApiClient::start(self, source, config).await
    }

    async fn nodes(&self) -> BackendResult<NodesSnapshot> {
        ApiClient::nodes(self).await
    }

    async fn open_progress(&self) -> BackendResult<EventStream> {
        ApiClient::open_progress(self).await
    }

    async fn stop(&self) -> BackendResult<()> {
        ApiClient::stop(self).await
    }

    async fn recheck(&self, id: NodeId, config: &CheckConfig) -> BackendResult<Node> {
        ApiClient::recheck(self, id, config).await
    }

    async fn rename(&self, id: NodeId, name: &str) -> BackendResult<()> {
        ApiClient::rename(self, id, name).await
    }

    async fn delete(&self, id: NodeId) -> BackendResult<()> {
        ApiClient::delete(self, id).await
    }

    async fn export(&self, ids: &[NodeId]) -> BackendResult<ExportDocument> {
        ApiClient::export(self, ids).await
    }
}
