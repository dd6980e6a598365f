//! HTTP bridge to a [`Wallet`].
//!
//! `POST /` accepts JSON-RPC requests (single or batch) and answers them with
//! [`Wallet::request_json`]. `POST /control` accepts a [`ControlRequest`].

use crate::{Wallet, control::ControlRequest, logging::SERVER_TARGET};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use futures::future::join_all;
use headless_wallet_rpc::{
    error::{ErrorCode, RpcError},
    request::{Request, RpcCall},
    response::{Response, RpcResponse},
};
use serde_json::{Value, json};
use std::{io, net::SocketAddr};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Builds the router of the bridge.
pub fn router(wallet: Wallet) -> Router {
    Router::new().route("/", post(handle_rpc)).route("/control", post(handle_control)).with_state(wallet)
}

/// Binds `addr` and serves the bridge in the background.
pub async fn serve(wallet: Wallet, addr: SocketAddr) -> io::Result<ServerHandle> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        axum::serve(listener, router(wallet))
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });
    info!(target: SERVER_TARGET, %addr, "wallet bridge listening");

    Ok(ServerHandle { addr, shutdown: Some(shutdown_tx), task })
}

/// A running bridge.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://` URL of the bridge.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stops accepting connections and waits for in-flight requests to finish.
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.map_err(io::Error::other)?
    }
}

async fn handle_rpc(
    State(wallet): State<Wallet>,
    request: Result<Json<Request>, JsonRejection>,
) -> axum::response::Response {
    match request {
        Err(err) => {
            warn!(target: SERVER_TARGET, %err, "invalid request");
            Json(Response::error(RpcError::invalid_request())).into_response()
        }
        Ok(Json(req)) => match handle_request(&wallet, req).await {
            Some(response) => Json(response).into_response(),
            // notifications get no response
            None => StatusCode::NO_CONTENT.into_response(),
        },
    }
}

async fn handle_request(wallet: &Wallet, req: Request) -> Option<Response> {
    match req {
        Request::Single(call) => handle_call(wallet, call).await.map(Response::Single),
        Request::Batch(calls) => {
            if calls.is_empty() {
                return Some(Response::error(RpcError::invalid_request()));
            }
            let responses = join_all(calls.into_iter().map(|call| handle_call(wallet, call)))
                .await
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
            (!responses.is_empty()).then_some(Response::Batch(responses))
        }
    }
}

async fn handle_call(wallet: &Wallet, call: RpcCall) -> Option<RpcResponse> {
    match call {
        RpcCall::MethodCall(call) => {
            trace!(target: SERVER_TARGET, id = %call.id, method = %call.method, "handling call");
            Some(wallet.request_json(call).await)
        }
        RpcCall::Notification(notification) => {
            trace!(target: SERVER_TARGET, method = %notification.method, "handling notification");
            if let Err(err) = wallet.request(&notification.method, notification.params).await {
                debug!(target: SERVER_TARGET, %err, "notification failed");
            }
            None
        }
        RpcCall::Invalid { id } => {
            warn!(target: SERVER_TARGET, %id, "invalid rpc call");
            Some(RpcResponse::invalid_request(id))
        }
    }
}

async fn handle_control(
    State(wallet): State<Wallet>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match body {
        Ok(Json(body)) => parse_control(body),
        Err(err) => Err(RpcError::with_message(ErrorCode::ParseError, err.body_text())),
    };
    let request = match request {
        Ok(request) => request,
        Err(err) => {
            warn!(target: SERVER_TARGET, %err, "invalid control request");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": err })));
        }
    };

    debug!(target: SERVER_TARGET, method = request.method(), "control");
    match wallet.control(request) {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(err) => (StatusCode::OK, Json(json!({ "error": err.to_rpc_error() }))),
    }
}

/// Brings a `{method, params}` body into the positional shape [`ControlRequest`] expects.
///
/// A missing `params` member means no arguments, a single non-array value is one argument.
fn parse_control(mut body: Value) -> Result<ControlRequest, RpcError> {
    let Some(obj) = body.as_object_mut() else {
        return Err(RpcError::invalid_request());
    };
    let params = match obj.remove("params") {
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(Value::Array(params)) => Value::Array(params),
        Some(param) => Value::Array(vec![param]),
    };
    obj.insert("params".to_string(), params);
    serde_json::from_value(body).map_err(|err| RpcError::invalid_params(err.to_string()))
}
