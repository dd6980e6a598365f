//! Forwarding of JSON-RPC calls to the chain node.

use crate::{
    error::{Result, TransportError, WalletError},
    logging::FORWARD_TARGET,
};
use headless_wallet_rpc::{
    error::RpcError,
    request::{Id, RequestParams, RpcMethodCall},
};
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use url::Url;

/// Delivers a JSON-RPC envelope to an endpoint and returns the raw response body.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync + fmt::Debug {
    async fn send(&self, url: &Url, call: &RpcMethodCall) -> Result<Value, TransportError>;
}

/// [`RpcTransport`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, url: &Url, call: &RpcMethodCall) -> Result<Value, TransportError> {
        let res = self.client.post(url.clone()).json(call).send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        match serde_json::from_slice(&body) {
            Ok(value) => Ok(value),
            // a JSON-RPC error body can come with any status, only report the status when the
            // body is not JSON
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// Builds JSON-RPC envelopes, sends them and unwraps the response.
#[derive(Clone, Debug)]
pub struct RpcForwarder {
    transport: Arc<dyn RpcTransport>,
}

impl RpcForwarder {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Sends `method` to `url` and returns the `result` member of the response.
    ///
    /// An `error` member is returned as [`WalletError::Rpc`] with the node's code, message and
    /// data untouched.
    pub async fn send(
        &self,
        url: &Url,
        method: &str,
        params: RequestParams,
        id: u64,
    ) -> Result<Value> {
        let call = RpcMethodCall::new(method, params, id);
        trace!(target: FORWARD_TARGET, %url, id, method, params = ?call.params, "forwarding");

        let response = self.transport.send(url, &call).await?;
        trace!(target: FORWARD_TARGET, id, ?response, "received");

        unwrap_response(response, &call.id)
    }
}

fn unwrap_response(response: Value, id: &Id) -> Result<Value> {
    let mut obj = match response {
        Value::Object(obj) => obj,
        other => {
            return Err(TransportError::InvalidResponse(format!(
                "expected a JSON-RPC response object for request {id}, got {other}"
            ))
            .into());
        }
    };

    if let Some(error) = obj.remove("error") {
        let error = serde_json::from_value::<RpcError>(error).map_err(|err| {
            TransportError::InvalidResponse(format!("malformed error object: {err}"))
        })?;
        return Err(WalletError::Rpc(error));
    }

    obj.remove("result").ok_or_else(|| {
        TransportError::InvalidResponse(format!("response to request {id} has no result")).into()
    })
}
