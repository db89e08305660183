// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Node REST API.
//!
//! [`NodeApi`] is the seam every other component talks to the chain through. [`NodeClient`] is
//! the HTTP implementation; tests substitute the generated `MockNodeApi`.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use reqwest::{header::CONTENT_TYPE, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::Mutex;

use crate::core::{
    crypto::Address,
    network::is_primary_host,
    transaction::{Transaction, TxId},
};

/// Spacing between calls to nodes outside the primary hosts.
pub const THIRD_PARTY_DELAY: Duration = Duration::from_secs(2);
/// Bound on a single HTTP exchange with the node.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid node url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("node responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("data entry {key:?} of {address} has type {found}, expected string")]
    UnexpectedDataType {
        address: String,
        key: String,
        found: String,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NodeApi: Send + Sync {
    /// Regular balance of `address` in the smallest unit.
    async fn balance(&self, address: &Address) -> Result<u64, NodeError>;

    /// String entry `key` of the account storage, `None` when absent.
    async fn string_value(&self, address: &Address, key: &str)
        -> Result<Option<String>, NodeError>;

    /// Base64 program installed on `address`, `None` for plain accounts.
    async fn script(&self, address: &Address) -> Result<Option<String>, NodeError>;

    async fn broadcast(&self, tx: &Transaction) -> Result<(), NodeError>;

    /// Whether the transaction is included in a block.
    async fn is_confirmed(&self, id: &TxId) -> Result<bool, NodeError>;

    async fn height(&self) -> Result<u64, NodeError>;

    async fn compile(&self, source: &[u8], compact: bool) -> Result<CompileResponse, NodeError>;

    async fn decompile(&self, script: &str) -> Result<String, NodeError>;
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    #[serde(alias = "Script")]
    pub script: String,
    #[serde(default, alias = "Complexity")]
    pub complexity: Option<u64>,
    #[serde(default, alias = "VerifierComplexity")]
    pub verifier_complexity: Option<u64>,
    #[serde(default, alias = "CallableComplexities")]
    pub callable_complexities: Option<BTreeMap<String, u64>>,
    #[serde(default, alias = "ExtraFee")]
    pub extra_fee: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct DataEntryResponse {
    #[serde(rename = "type")]
    entry_type: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ScriptInfoResponse {
    #[serde(default)]
    script: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: u64,
}

#[derive(Debug, Deserialize)]
struct DecompileResponse {
    script: String,
}

pub struct NodeClient {
    client: reqwest::Client,
    base: Url,
    throttle: Option<Arc<Mutex<()>>>,
}

impl NodeClient {
    /// Creates a client for the node at `url`. Nodes outside `primary_hosts` are throttled.
    pub fn new(url: &str, primary_hosts: &[impl AsRef<str>]) -> Result<Self, NodeError> {
        let base = Url::parse(url).map_err(|err| NodeError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(NodeError::InvalidUrl {
                url: url.to_string(),
                reason: "not a base url".into(),
            });
        }
        let throttle = if is_primary_host(url, primary_hosts) {
            None
        } else {
            debug!(@grey, "throttling calls to third-party node {url}");
            Some(Arc::new(Mutex::new(())))
        };
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base,
            throttle,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Serializes calls to third-party nodes with a fixed spacing.
    async fn throttle(&self) {
        if let Some(lock) = &self.throttle {
            let _guard = lock.lock().await;
            tokio::time::sleep(THIRD_PARTY_DELAY).await;
        }
    }

    /// Sends a request, returning the status and body text.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<(Vec<u8>, &'static str)>,
    ) -> Result<(StatusCode, String), NodeError> {
        self.throttle().await;
        debug!(@grey, "{method} {url}");
        let mut request = self.client.request(method, url);
        if let Some((body, content_type)) = body {
            request = request.header(CONTENT_TYPE, content_type).body(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, NodeError> {
        let (status, text) = self.execute(Method::GET, self.url(segments), None).await?;
        check_status(status, text).and_then(|text| Ok(serde_json::from_str(&text)?))
    }

    async fn post_text<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Vec<u8>,
    ) -> Result<T, NodeError> {
        let (status, text) = self
            .execute(Method::POST, url, Some((body, "text/plain")))
            .await?;
        check_status(status, text).and_then(|text| Ok(serde_json::from_str(&text)?))
    }
}

fn check_status(status: StatusCode, body: String) -> Result<String, NodeError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(NodeError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl NodeApi for NodeClient {
    async fn balance(&self, address: &Address) -> Result<u64, NodeError> {
        let address = address.to_string();
        let response: BalanceResponse = self.get(&["addresses", "balance", &address]).await?;
        Ok(response.balance)
    }

    async fn string_value(
        &self,
        address: &Address,
        key: &str,
    ) -> Result<Option<String>, NodeError> {
        let address = address.to_string();
        let url = self.url(&["addresses", "data", &address, key]);
        let (status, text) = self.execute(Method::GET, url, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let entry: DataEntryResponse = serde_json::from_str(&check_status(status, text)?)?;
        match entry.value {
            serde_json::Value::String(value) if entry.entry_type == "string" => Ok(Some(value)),
            _ => Err(NodeError::UnexpectedDataType {
                address,
                key: key.to_string(),
                found: entry.entry_type,
            }),
        }
    }

    async fn script(&self, address: &Address) -> Result<Option<String>, NodeError> {
        let address = address.to_string();
        let response: ScriptInfoResponse =
            self.get(&["addresses", "scriptInfo", &address]).await?;
        Ok(response.script.filter(|script| !script.is_empty()))
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<(), NodeError> {
        let body = serde_json::to_vec(tx)?;
        let url = self.url(&["transactions", "broadcast"]);
        let (status, text) = self
            .execute(Method::POST, url, Some((body, "application/json")))
            .await?;
        check_status(status, text).map(|_| ())
    }

    async fn is_confirmed(&self, id: &TxId) -> Result<bool, NodeError> {
        let id = id.to_string();
        let url = self.url(&["transactions", "info", &id]);
        let (status, text) = self.execute(Method::GET, url, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(status, text).map(|_| true)
    }

    async fn height(&self) -> Result<u64, NodeError> {
        let response: HeightResponse = self.get(&["blocks", "height"]).await?;
        Ok(response.height)
    }

    async fn compile(&self, source: &[u8], compact: bool) -> Result<CompileResponse, NodeError> {
        let mut url = self.url(&["utils", "script", "compileCode"]);
        url.query_pairs_mut()
            .append_pair("compact", if compact { "true" } else { "false" });
        self.post_text(url, source.to_vec()).await
    }

    async fn decompile(&self, script: &str) -> Result<String, NodeError> {
        let url = self.url(&["utils", "script", "decompile"]);
        let response: DecompileResponse = self.post_text(url, script.as_bytes().to_vec()).await?;
        Ok(response.script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::network::PRIMARY_HOSTS;

    #[test]
    fn urls_escape_data_keys() {
        let client = NodeClient::new("https://nodes.wx.network/", PRIMARY_HOSTS).unwrap();
        let url = client.url(&["addresses", "data", "3P", "%s__allowedLpScriptHash"]);
        assert_eq!(
            url.as_str(),
            "https://nodes.wx.network/addresses/data/3P/%25s__allowedLpScriptHash"
        );
        assert!(client.throttle.is_none());
    }

    #[test]
    fn third_party_nodes_are_throttled() {
        let client = NodeClient::new("http://127.0.0.1:6869", PRIMARY_HOSTS).unwrap();
        assert!(client.throttle.is_some());
        assert_eq!(
            client.url(&["blocks", "height"]).as_str(),
            "http://127.0.0.1:6869/blocks/height"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            NodeClient::new("mailto:ops@example.org", PRIMARY_HOSTS),
            Err(NodeError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn compile_response_accepts_both_casings() {
        let camel: CompileResponse = serde_json::from_str(
            r#"{"script":"base64:AAEB","complexity":12,"verifierComplexity":0,"callableComplexities":{"call":12},"extraFee":0}"#,
        )
        .unwrap();
        assert_eq!(camel.script, "base64:AAEB");
        assert_eq!(camel.callable_complexities.unwrap()["call"], 12);

        let pascal: CompileResponse =
            serde_json::from_str(r#"{"Script":"AAEB","Complexity":3}"#).unwrap();
        assert_eq!(pascal.script, "AAEB");
        assert_eq!(pascal.complexity, Some(3));
    }
}
