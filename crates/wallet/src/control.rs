//! Name-addressed control operations.

use crate::{
    Wallet,
    accounts::AccountSelector,
    error::Result,
    serde_helpers::{empty_params, lenient_chain_id, sequence},
};
use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A control operation with primitive arguments, as sent by a harness in another process.
///
/// Serialized as `{"method": "switchChain", "params": ["0xa4b1"]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ControlRequest {
    /// Index, address or private key, see [`AccountSelector::parse`].
    #[serde(rename = "switchAccount", with = "sequence")]
    SwitchAccount(Value),
    #[serde(rename = "switchChain", with = "lenient_chain_id")]
    SwitchChain(ChainId),
    #[serde(rename = "setRejectSignature", with = "sequence")]
    SetRejectSignature(bool),
    #[serde(rename = "setRejectTransaction", with = "sequence")]
    SetRejectTransaction(bool),
    #[serde(rename = "disconnect", with = "empty_params")]
    Disconnect(()),
}

impl ControlRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::SwitchAccount(_) => "switchAccount",
            Self::SwitchChain(_) => "switchChain",
            Self::SetRejectSignature(_) => "setRejectSignature",
            Self::SetRejectTransaction(_) => "setRejectTransaction",
            Self::Disconnect(()) => "disconnect",
        }
    }
}

impl Wallet {
    /// Executes a [`ControlRequest`].
    pub fn control(&self, request: ControlRequest) -> Result<()> {
        match request {
            ControlRequest::SwitchAccount(account) => {
                self.switch_account(AccountSelector::parse(&account)?)?;
            }
            ControlRequest::SwitchChain(chain_id) => self.switch_chain(chain_id)?,
            ControlRequest::SetRejectSignature(reject) => self.set_reject_signature(reject),
            ControlRequest::SetRejectTransaction(reject) => self.set_reject_transaction(reject),
            ControlRequest::Disconnect(()) => self.disconnect(),
        }
        Ok(())
    }
}
