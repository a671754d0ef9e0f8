use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Backend-assigned node identity. Never minted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

pub const UNKNOWN_MARK: &str = "❓";
pub const NOT_APPLICABLE_MARK: &str = "N/A";

/// A result column as reported by the checker. Sentinels are kept apart from
/// real values so callers never have to compare against magic strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "String")]
pub enum FieldValue {
    /// Not filled in yet (the service pre-fills pending rows with "").
    Pending,
    #[default]
    Unknown,
    NotApplicable,
    Value(String),
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Pending => "",
            FieldValue::Unknown => UNKNOWN_MARK,
            FieldValue::NotApplicable => NOT_APPLICABLE_MARK,
            FieldValue::Value(v) => v.as_str(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "" => FieldValue::Pending,
            UNKNOWN_MARK => FieldValue::Unknown,
            NOT_APPLICABLE_MARK => FieldValue::NotApplicable,
            _ => FieldValue::Value(raw),
        }
    }
}

/// Result columns are usually strings, but a bare number or flag is kept as
/// its text rather than failing the whole frame.
impl From<Option<Value>> for FieldValue {
    fn from(raw: Option<Value>) -> Self {
        match raw {
            None | Some(Value::Null) => FieldValue::Unknown,
            Some(Value::String(s)) => FieldValue::from(s),
            Some(other) => FieldValue::Value(other.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(raw: &str) -> Self {
        FieldValue::from(raw.to_string())
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Value(v) => v,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proxy entry under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub ip: FieldValue,
    #[serde(default)]
    pub risk: FieldValue,
    #[serde(default)]
    pub bot: FieldValue,
    #[serde(default)]
    pub shared: FieldValue,
    #[serde(default, rename = "type")]
    pub ip_type: FieldValue,
    #[serde(default)]
    pub native: FieldValue,
    #[serde(default)]
    pub source: FieldValue,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Everything else the service attaches (proxy_config and friends).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            original_name: name.clone(),
            name,
            ip: FieldValue::Unknown,
            risk: FieldValue::Unknown,
            bot: FieldValue::NotApplicable,
            shared: FieldValue::NotApplicable,
            ip_type: FieldValue::Unknown,
            native: FieldValue::Unknown,
            source: FieldValue::Unknown,
            status: String::new(),
            error: None,
            extra: Map::new(),
        }
    }

    /// The name the node was first observed under, falling back to the
    /// current name when the service did not report one.
    pub fn label(&self) -> &str {
        if self.original_name.is_empty() {
            &self.name
        } else {
            &self.original_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Ping0,
    Ippure,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ping0 => "ping0",
            Source::Ippure => "ippure",
        }
    }
}

pub const DEFAULT_SKIP_KEYWORDS: &str = "剩余,重置,到期,有效期,官网,网址,更新,公告,建议";

/// Options sent along with start and recheck requests. The controller
/// never mutates it; a run sees the snapshot it was started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// `true` runs the API-based checker, `false` drives a browser.
    pub fast_mode: bool,
    pub clash_api_url: String,
    pub clash_api_secret: String,
    pub source: Source,
    pub fallback: bool,
    pub output_suffix: String,
    pub selector_name: String,
    pub headless: bool,
    pub skip_keywords_str: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fast_mode: true,
            clash_api_url: "http://127.0.0.1:9097".to_string(),
            clash_api_secret: String::new(),
            source: Source::Ping0,
            fallback: true,
            output_suffix: "_checked".to_string(),
            selector_name: "GLOBAL".to_string(),
            headless: true,
            skip_keywords_str: DEFAULT_SKIP_KEYWORDS.to_string(),
        }
    }
}

impl CheckConfig {
    pub fn skip_keywords(&self) -> Vec<String> {
        self.skip_keywords_str
            .split(',')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One frame of the progress feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress {
        progress: usize,
        #[serde(default)]
        total: Option<usize>,
        #[serde(default)]
        node: Option<Node>,
    },
    Update {
        node: Node,
    },
    Complete {
        #[serde(default)]
        total: Option<usize>,
    },
    Stopped,
    Error {
        #[serde(default)]
        node_name: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Stopped)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub node_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { total: usize },
    /// Another run is active; the caller should attach to its stream.
    AlreadyRunning,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodesSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub is_running: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportDocument {
    pub yaml: String,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Flatten `detail` into display text; structured details are rendered
    /// as JSON.
    pub(crate) fn into_message(self) -> Option<String> {
        match self.detail? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_value_sentinels_are_recognised() {
        assert_eq!(FieldValue::from("❓"), FieldValue::Unknown);
        assert_eq!(FieldValue::from("N/A"), FieldValue::NotApplicable);
        assert_eq!(FieldValue::from(""), FieldValue::Pending);
        assert_eq!(FieldValue::from("35%"), FieldValue::Value("35%".to_string()));
        assert_eq!(String::from(FieldValue::Unknown), "❓");
        assert_eq!(FieldValue::from(None::<Value>), FieldValue::Unknown);
    }

    #[test]
    fn node_keeps_unknown_fields() {
        let raw = json!({
            "id": 3,
            "name": "HK 01 ⚪",
            "original_name": "HK 01",
            "ip": "1.2.3.4",
            "risk": "5%",
            "type": "IDC",
            "status": "✅",
            "proxy_config": {"name": "HK 01", "type": "ss"}
        });

        let node: Node = serde_json::from_value(raw).unwrap();
        assert_eq!(node.id, NodeId(3));
        assert_eq!(node.ip_type, FieldValue::Value("IDC".to_string()));
        assert_eq!(node.shared, FieldValue::Unknown);
        assert!(node.extra.contains_key("proxy_config"));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["proxy_config"]["type"], "ss");
        assert_eq!(back["type"], "IDC");
    }

    #[test]
    fn non_string_fields_keep_their_text() {
        let raw = json!({
            "id": 8,
            "name": "SG 08",
            "risk": 35,
            "native": true,
            "shared": null
        });
        let node: Node = serde_json::from_value(raw).unwrap();
        assert_eq!(node.risk, FieldValue::Value("35".to_string()));
        assert_eq!(node.native, FieldValue::Value("true".to_string()));
        assert_eq!(node.shared, FieldValue::Unknown);

        let frame = r#"{"type":"update","node":{"id":8,"name":"SG 08","risk":12.5}}"#;
        let event: StreamEvent = serde_json::from_str(frame).unwrap();
        match event {
            StreamEvent::Update { node } => assert_eq!(node.risk.as_str(), "12.5"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn label_falls_back_to_name() {
        let mut node = Node::new(1, "JP 02");
        node.original_name.clear();
        assert_eq!(node.label(), "JP 02");
    }

    #[test]
    fn stream_events_decode_by_type() {
        let progress: StreamEvent = serde_json::from_str(
            r#"{"type":"progress","progress":2,"total":5,"node":{"id":1,"name":"a","original_name":"a"}}"#,
        )
        .unwrap();
        assert!(matches!(progress, StreamEvent::Progress { progress: 2, total: Some(5), node: Some(_) }));

        let stopped: StreamEvent = serde_json::from_str(r#"{"type":"stopped"}"#).unwrap();
        assert!(stopped.is_terminal());

        let error: StreamEvent =
            serde_json::from_str(r#"{"type":"error","node_name":"x","error":"boom"}"#).unwrap();
        assert!(!error.is_terminal());
    }

    #[test]
    fn skip_keywords_drop_blanks() {
        let config = CheckConfig {
            skip_keywords_str: " 到期, ,官网,".to_string(),
            ..CheckConfig::default()
        };
        assert_eq!(config.skip_keywords(), vec!["到期", "官网"]);
    }

    #[test]
    fn error_detail_objects_become_text() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":{"loc":["x"],"msg":"bad"}}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), r#"{"loc":["x"],"msg":"bad"}"#);

        let body: ErrorBody = serde_json::from_str(r#"{"detail":"任务正在运行中"}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), "任务正在运行中");
    }
}
