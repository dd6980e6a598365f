//! Mutable session state of a wallet.

use crate::{
    error::{Result, WalletError},
    sign::Signer,
};
use alloy_primitives::{Address, ChainId};
use std::{collections::BTreeMap, fmt, sync::Arc};
use url::Url;

/// The chain requests are currently routed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveChain {
    pub id: ChainId,
    pub rpc_url: Url,
}

/// Chain id to RPC endpoint routing, with a fallback for chains without an entry.
#[derive(Clone, Debug)]
pub struct ChainRoutes {
    urls: BTreeMap<ChainId, Url>,
    default: Url,
}

impl ChainRoutes {
    pub fn new(urls: BTreeMap<ChainId, Url>, default: Url) -> Self {
        Self { urls, default }
    }

    pub fn resolve(&self, chain_id: ChainId) -> &Url {
        self.urls.get(&chain_id).unwrap_or(&self.default)
    }

    pub fn active(&self, chain_id: ChainId) -> ActiveChain {
        ActiveChain { id: chain_id, rpc_url: self.resolve(chain_id).clone() }
    }
}

/// The chains a session may switch to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupportedChains {
    /// No chains were configured, any id is accepted.
    Any,
    Only(Vec<ChainId>),
}

impl SupportedChains {
    pub fn contains(&self, chain_id: ChainId) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ids) => ids.contains(&chain_id),
        }
    }

    /// The configured ids, empty in [`SupportedChains::Any`] mode.
    pub fn ids(&self) -> &[ChainId] {
        match self {
            Self::Any => &[],
            Self::Only(ids) => ids,
        }
    }
}

/// Session state, guarded by the wallet's lock.
///
/// Fields are only changed through the validating methods below: the active account always
/// matches the signing identity and the active chain is always a supported one.
pub struct Session {
    identity: Arc<dyn Signer>,
    accounts: Vec<Address>,
    chain: ActiveChain,
    supported: SupportedChains,
    routes: ChainRoutes,
    is_connected: bool,
    reject_signature: bool,
    reject_transaction: bool,
}

impl Session {
    pub fn new(
        identity: Arc<dyn Signer>,
        chain_id: ChainId,
        supported: SupportedChains,
        routes: ChainRoutes,
    ) -> Self {
        let accounts = vec![identity.address()];
        let chain = routes.active(chain_id);
        Self {
            identity,
            accounts,
            chain,
            supported,
            routes,
            is_connected: false,
            reject_signature: false,
            reject_transaction: false,
        }
    }

    pub fn identity(&self) -> &Arc<dyn Signer> {
        &self.identity
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn chain(&self) -> &ActiveChain {
        &self.chain
    }

    pub fn supported(&self) -> &SupportedChains {
        &self.supported
    }

    pub fn routes(&self) -> &ChainRoutes {
        &self.routes
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn reject_signature(&self) -> bool {
        self.reject_signature
    }

    pub fn reject_transaction(&self) -> bool {
        self.reject_transaction
    }

    /// Marks the session connected, returns `true` if it was not connected before.
    pub fn connect(&mut self) -> bool {
        !std::mem::replace(&mut self.is_connected, true)
    }

    /// Replaces the signing identity and the active account, dropping the previous identity.
    pub fn set_identity(&mut self, identity: Arc<dyn Signer>) -> Address {
        let address = identity.address();
        self.accounts = vec![address];
        self.identity = identity;
        address
    }

    /// Makes `chain_id` the active chain.
    ///
    /// Fails without touching the session if the chain is not supported.
    pub fn switch_chain(&mut self, chain_id: ChainId) -> Result<&ActiveChain> {
        if !self.supported.contains(chain_id) {
            return Err(WalletError::UnsupportedChain {
                chain_id,
                supported: self.supported.ids().to_vec(),
            });
        }
        self.chain = self.routes.active(chain_id);
        Ok(&self.chain)
    }

    pub fn set_reject_signature(&mut self, reject: bool) {
        self.reject_signature = reject;
    }

    pub fn set_reject_transaction(&mut self, reject: bool) {
        self.reject_transaction = reject;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("accounts", &self.accounts)
            .field("chain", &self.chain)
            .field("supported", &self.supported)
            .field("is_connected", &self.is_connected)
            .field("reject_signature", &self.reject_signature)
            .field("reject_transaction", &self.reject_transaction)
            .finish_non_exhaustive()
    }
}
