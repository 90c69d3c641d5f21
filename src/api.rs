use crate::error::GraphDlError;
use crate::types::{HostRecord, ItemRecord};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Thin Zabbix JSON-RPC client for host and item lookups.
pub struct ApiClient {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl ApiClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self, GraphDlError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.into(),
            token: token.into(),
        })
    }

    /// First host whose technical name matches exactly, if any.
    pub async fn resolve_host(&self, name: &str) -> Result<Option<HostRecord>, GraphDlError> {
        let params = json!({
            "output": ["hostid"],
            "filter": { "host": name },
        });
        let hosts: Vec<HostRecord> = self.call("host.get", params).await?;
        Ok(hosts.into_iter().next())
    }

    pub async fn list_items(&self, host_id: &str) -> Result<Vec<ItemRecord>, GraphDlError> {
        let params = json!({
            "output": ["itemid", "hostid", "name"],
            "hostids": host_id,
        });
        self.call("item.get", params).await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, GraphDlError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        debug!("JSON-RPC {} -> {}", method, self.url);

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GraphDlError::ApiError(format!(
                "{} returned HTTP {}",
                method,
                resp.status()
            )));
        }

        let text = resp.text().await?;
        let mut body: Value = serde_json::from_str(&text)
            .map_err(|e| GraphDlError::ApiError(format!("{} returned invalid JSON: {}", method, e)))?;

        if let Some(err) = body.get("error") {
            return Err(GraphDlError::ApiError(format!(
                "{} failed: {} {}",
                method,
                err.get("message").and_then(Value::as_str).unwrap_or("unknown error"),
                err.get("data").and_then(Value::as_str).unwrap_or_default()
            )));
        }

        let result = body
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| GraphDlError::ApiError(format!("{} response has no result field", method)))?;

        serde_json::from_value(result)
            .map_err(|e| GraphDlError::ApiError(format!("{} result has unexpected shape: {}", method, e)))
    }
}
