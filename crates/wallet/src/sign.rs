//! Signing identities.

use crate::{
    error::{Result, TransportError, WalletError},
    session::ActiveChain,
};
use alloy_dyn_abi::TypedData;
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Signature, TxHash};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::Signer as _;
use alloy_signer_local::PrivateKeySigner;
use std::time::Duration;

/// The identity that produces signatures for the active account.
///
/// Everything cryptographic is delegated to an implementation of this trait, the wallet only
/// decides _what_ to sign and _where_ to send it.
#[async_trait::async_trait]
pub trait Signer: Send + Sync + std::fmt::Debug {
    /// The address signatures recover to.
    fn address(&self) -> Address;

    /// Signs `request` and submits it to the node of `chain`, returning the transaction hash.
    async fn send_transaction(
        &self,
        chain: &ActiveChain,
        request: TransactionRequest,
    ) -> Result<TxHash>;

    /// Signs `message` with the EIP-191 personal message prefix.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature>;

    /// Signs an EIP-712 typed data payload.
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature>;
}

/// A [`Signer`] backed by a local private key.
///
/// Transactions are filled (nonce, gas, fees) and signed by an alloy provider connected to the
/// chain's RPC endpoint.
#[derive(Clone, Debug)]
pub struct DevSigner {
    signer: PrivateKeySigner,
    timeout: Duration,
}

impl DevSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer, timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT) }
    }

    /// Bounds the time spent submitting a transaction.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inner(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl From<PrivateKeySigner> for DevSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self::new(signer)
    }
}

#[async_trait::async_trait]
impl Signer for DevSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn send_transaction(
        &self,
        chain: &ActiveChain,
        request: TransactionRequest,
    ) -> Result<TxHash> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(chain.rpc_url.clone());

        let pending = tokio::time::timeout(self.timeout, provider.send_transaction(request))
            .await
            .map_err(|_| {
                TransportError::Provider(format!(
                    "timed out after {}s submitting transaction to {}",
                    self.timeout.as_secs(),
                    chain.rpc_url
                ))
            })??;
        Ok(*pending.tx_hash())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.signer.sign_message(message).await.map_err(WalletError::from)
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature> {
        self.signer.sign_dynamic_typed_data(payload).await.map_err(WalletError::from)
    }
}
