use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

const JSONRPC_VERSION: &str = "2.0";
const JSONRPC_CONTENT_TYPE: &str = "application/json-rpc";

/// URL of the JSON-RPC endpoint, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Endpoint(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    auth: Option<&'a str>,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// One JSON-RPC round trip per `call`, ids strictly increasing from 1.
pub struct Transport {
    client: Client,
    endpoint: Endpoint,
    last_id: Cell<u64>,
}

impl Transport {
    pub fn new(endpoint: Endpoint, options: &TransportOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            last_id: Cell::new(0),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        id
    }

    pub fn call(&self, method: &str, params: &Value, auth: Option<&str>) -> Result<Value> {
        let id = self.next_id();
        let body = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            auth,
            id,
        };
        let encoded = serde_json::to_vec(&body)
            .map_err(|e| Error::invalid_response(method, format!("cannot encode request: {e}")))?;

        debug!(method, id, endpoint = %self.endpoint, "sending JSON-RPC request");

        let res = self
            .client
            .post(self.endpoint.as_str())
            .header(CONTENT_TYPE, JSONRPC_CONTENT_TYPE)
            .body(encoded)
            .send()?
            .error_for_status()?;

        let text = res.text()?;
        let response: RpcResponse = serde_json::from_str(&text)
            .map_err(|e| Error::invalid_response(method, format!("invalid JSON: {e}")))?;

        if let Some(err) = response.error {
            return Err(Error::Api {
                method: method.to_string(),
                code: err.code,
                message: err.message,
                data: err.data.map(|d| match d {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            });
        }

        response
            .result
            .ok_or_else(|| Error::invalid_response(method, "neither result nor error in response"))
    }
}
