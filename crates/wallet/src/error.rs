//! Error types of the wallet provider.

use alloy_primitives::ChainId;
use headless_wallet_rpc::error::{ErrorCode, RpcError};
use itertools::Itertools;
use std::fmt;

/// Result alias used throughout the request path.
pub type Result<T, E = WalletError> = std::result::Result<T, E>;

/// Failure to reach an RPC endpoint or to make sense of what it sent back.
///
/// These never carry a wallet error code, they are reported to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("endpoint responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode JSON-RPC response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
    #[error("provider transport error: {0}")]
    Provider(String),
}

/// Which of the rejection toggles tripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Signature,
    Transaction,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => f.write_str("User rejected the signature request."),
            Self::Transaction => f.write_str("User rejected the transaction request."),
        }
    }
}

/// Errors surfaced by [`Wallet::request`](crate::Wallet::request) and the control surface.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The RPC endpoint could not be reached or answered garbage.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The RPC endpoint answered with an explicit error object.
    #[error("{}", .0.message)]
    Rpc(RpcError),
    /// A rejection toggle is active.
    #[error("{0}")]
    Rejected(Rejection),
    #[error("The method \"{0}\" is not supported by this wallet")]
    UnsupportedMethod(String),
    #[error(
        "Unrecognized chain ID {chain_id}. Supported chain IDs: [{}]",
        .supported.iter().join(", ")
    )]
    UnsupportedChain { chain_id: ChainId, supported: Vec<ChainId> },
    /// The account-switch input does not match any accepted shape.
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Signer error: {0}")]
    Signer(String),
}

impl WalletError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns the numeric wallet error code, transport failures have none.
    pub fn code(&self) -> Option<i64> {
        let code = match self {
            Self::Transport(_) => return None,
            Self::Rpc(err) => err.code,
            Self::Rejected(_) => ErrorCode::UserRejectedRequest,
            Self::UnsupportedMethod(_) => ErrorCode::UnsupportedMethod,
            Self::UnsupportedChain { .. } => ErrorCode::UnrecognizedChain,
            Self::InvalidInput(_) | Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::Signer(_) => ErrorCode::InternalError,
        };
        Some(code.code())
    }

    /// Converts the error into the JSON-RPC error object returned over the wire.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Rpc(err) => err.clone(),
            Self::Transport(err) => RpcError::internal_error_with(err.to_string()),
            Self::Rejected(_) => RpcError::user_rejected(self.to_string()),
            Self::UnsupportedMethod(_) => RpcError::unsupported_method(self.to_string()),
            Self::UnsupportedChain { .. } => RpcError::unrecognized_chain(self.to_string()),
            Self::InvalidInput(msg) | Self::InvalidParams(msg) => RpcError::invalid_params(msg.clone()),
            Self::Signer(msg) => RpcError::internal_error_with(msg.clone()),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        Self::Rpc(err)
    }
}

impl From<alloy_signer::Error> for WalletError {
    fn from(err: alloy_signer::Error) -> Self {
        Self::Signer(err.to_string())
    }
}

impl From<alloy_transport::TransportError> for WalletError {
    fn from(err: alloy_transport::TransportError) -> Self {
        // keep node-level errors distinguishable from connection failures
        if let Some(payload) = err.as_error_resp() {
            return Self::Rpc(RpcError {
                code: payload.code.into(),
                message: payload.message.to_string().into(),
                data: payload.data.as_ref().and_then(|raw| serde_json::from_str(raw.get()).ok()),
            });
        }
        Self::Transport(TransportError::Provider(err.to_string()))
    }
}
