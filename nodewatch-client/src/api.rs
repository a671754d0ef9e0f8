use crate::error::{ClientError, Result};
use crate::model::{
    CheckConfig, ErrorBody, ExportDocument, Node, NodeId, NodesSnapshot, StartOutcome, Validation,
};
use crate::stream::{EventStream, spawn_reader};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Thin typed wrapper over the checker service's HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

#[derive(Deserialize)]
struct StartBody {
    total: usize,
}

#[derive(Deserialize)]
struct RecheckBody {
    node: Node,
}

impl ApiClient {
    pub fn new(base: Url) -> Result<Self> {
        Self::with_timeout(base, 30)
    }

    /// `timeout_secs` bounds connection setup only; the progress feed is a
    /// long-lived response and must not be cut off by a total timeout.
    pub fn with_timeout(base: Url, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("nodewatch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, base })
    }

    /// Send `request`, reporting an unreachable service as `Connection`.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_connect() {
                ClientError::Connection(format!("{}: {}", self.base, e))
            } else {
                ClientError::HttpError(e)
            }
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}{}: {}", self.base, path, e)))
    }

    /// Turn a non-success response into `Rejected`, reading `detail` in
    /// whatever shape the service sent it.
    async fn reject(response: Response) -> ClientError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        ClientError::Rejected {
            status: status.as_u16(),
            detail,
        }
    }

    async fn expect_success(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::reject(response).await)
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::DecodeError(e.to_string()))
    }

    pub async fn validate(&self, source: &str) -> Result<Validation> {
        let request = self
            .client
            .post(self.endpoint("/api/validate")?)
            .json(&json!({ "yaml_content": source }));
        let response = self.send(request).await?;

        // Invalid input comes back as 400 with a regular validation body.
        let status = response.status();
        if status.is_success() || status == StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            if let Ok(validation) = serde_json::from_str::<Validation>(&body) {
                return Ok(validation);
            }
            return Err(ClientError::DecodeError(format!(
                "unexpected validation body ({}): {}",
                status, body
            )));
        }

        Err(Self::reject(response).await)
    }

    pub async fn start(&self, source: &str, config: &CheckConfig) -> Result<StartOutcome> {
        let request = self
            .client
            .post(self.endpoint("/api/start")?)
            .json(&json!({ "yaml_content": source, "config": config }));
        let response = self.send(request).await?;

        if response.status() == StatusCode::CONFLICT {
            info!("A check is already running, attaching to it");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let response = Self::expect_success(response).await?;
        let body: StartBody = Self::decode(response).await?;
        Ok(StartOutcome::Started { total: body.total })
    }

    pub async fn nodes(&self) -> Result<NodesSnapshot> {
        let response = self.send(self.client.get(self.endpoint("/api/nodes")?)).await?;
        let response = Self::expect_success(response).await?;
        Self::decode(response).await
    }

    /// Open the progress feed. Events arrive on the returned stream in the
    /// order the service produced them.
    pub async fn open_progress(&self) -> Result<EventStream> {
        let request = self
            .client
            .get(self.endpoint("/api/progress")?)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let response = self.send(request).await?;
        let response = Self::expect_success(response).await?;

        debug!("Progress stream connected");
        Ok(spawn_reader(response))
    }

    pub async fn stop(&self) -> Result<()> {
        let response = self.send(self.client.post(self.endpoint("/api/stop")?)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn recheck(&self, id: NodeId, config: &CheckConfig) -> Result<Node> {
        let request = self
            .client
            .post(self.endpoint(&format!("/api/nodes/{}/recheck", id))?)
            .json(&json!({ "config": config }));
        let response = self.send(request).await?;
        let response = Self::expect_success(response).await?;
        let body: RecheckBody = Self::decode(response).await?;
        Ok(body.node)
    }

    pub async fn rename(&self, id: NodeId, name: &str) -> Result<()> {
        let request = self
            .client
            .put(self.endpoint(&format!("/api/nodes/{}", id))?)
            .json(&json!({ "name": name }));
        let response = self.send(request).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn delete(&self, id: NodeId) -> Result<()> {
        let request = self
            .client
            .delete(self.endpoint(&format!("/api/nodes/{}", id))?);
        let response = self.send(request).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn export(&self, ids: &[NodeId]) -> Result<ExportDocument> {
        let request = self
            .client
            .post(self.endpoint("/api/export")?)
            .json(&json!({ "node_ids": ids }));
        let response = self.send(request).await?;
        let response = Self::expect_success(response).await?;
        Self::decode(response).await
    }
}
