//! Wallet configuration.

use crate::{
    accounts::{
        AccountGenerator, DEFAULT_ACCOUNT_COUNT, DEFAULT_DERIVATION_PATH, DEFAULT_MNEMONIC,
        DevAccounts,
    },
    forward::RpcTransport,
    session::{ChainRoutes, SupportedChains},
    sign::{DevSigner, Signer},
};
use alloy_primitives::{B256, ChainId};
use alloy_signer_local::PrivateKeySigner;
use eyre::WrapErr;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, sync::Arc, time::Duration};
use url::Url;

/// Default chain id of a local anvil node.
pub const DEFAULT_CHAIN_ID: ChainId = 31337;

/// Endpoint of a local anvil node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default timeout of requests to the node, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 45;

/// File name of the config file.
pub const CONFIG_FILE: &str = "wallet.toml";

/// Prefix of environment variables that override config values.
pub const ENV_PREFIX: &str = "WALLET_";

/// What to do with method names that are in none of the method tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownMethodPolicy {
    /// Treat as a read and forward to the node.
    #[default]
    Forward,
    /// Fail with the unsupported-method error.
    Reject,
}

/// A chain the wallet can switch to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
}

impl ChainConfig {
    pub fn new(id: ChainId) -> Self {
        Self { id, name: None, rpc_url: None }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_rpc_url(mut self, rpc_url: Url) -> Self {
        self.rpc_url = Some(rpc_url);
        self
    }
}

/// Configuration of a [`Wallet`](crate::Wallet).
///
/// Can be built in code with the `with_*` setters, or loaded with [`WalletConfig::load`] from
/// `wallet.toml` and `WALLET_*` environment variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Chains the wallet may switch to, the first one is active initially.
    ///
    /// If empty, any chain id is accepted and [`DEFAULT_CHAIN_ID`] is active initially.
    pub chains: Vec<ChainConfig>,
    /// Per chain RPC endpoints, take precedence over [`ChainConfig::rpc_url`].
    #[serde(with = "chain_id_map")]
    pub rpc_urls: BTreeMap<ChainId, Url>,
    /// Endpoint of chains without a configured URL.
    pub default_rpc_url: Url,
    /// Key of the initial account, dev account 0 if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<B256>,
    /// Mnemonic the dev accounts are derived from.
    pub mnemonic: String,
    pub derivation_path: String,
    /// Number of dev accounts.
    pub accounts: usize,
    /// Trace every request at `debug` level.
    pub debug: bool,
    pub unknown_methods: UnknownMethodPolicy,
    /// Timeout of requests to the node, in seconds.
    pub request_timeout: u64,
    /// Injected dev account table, replaces the derived one.
    #[serde(skip)]
    pub dev_accounts: Option<DevAccounts>,
    /// Injected signing identity, takes precedence over `private_key`.
    #[serde(skip)]
    pub signer: Option<Arc<dyn Signer>>,
    /// Injected transport for forwarded calls, HTTP if unset.
    #[serde(skip)]
    pub transport: Option<Arc<dyn RpcTransport>>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chains: Vec::new(),
            rpc_urls: BTreeMap::new(),
            default_rpc_url: Url::parse(DEFAULT_RPC_URL).expect("valid default URL"),
            private_key: None,
            mnemonic: DEFAULT_MNEMONIC.to_string(),
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
            accounts: DEFAULT_ACCOUNT_COUNT,
            debug: false,
            unknown_methods: UnknownMethodPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dev_accounts: None,
            signer: None,
            transport: None,
        }
    }
}

impl WalletConfig {
    /// Returns the default figment: defaults, then `wallet.toml` in the current directory, then
    /// `WALLET_*` environment variables.
    pub fn figment() -> Figment {
        Self::figment_with_root(".")
    }

    /// Same as [`WalletConfig::figment`] but reads `wallet.toml` from `root`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(root.as_ref().join(CONFIG_FILE)))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> eyre::Result<Self> {
        Self::figment().extract().wrap_err("failed to load wallet config")
    }

    pub fn load_with_root(root: impl AsRef<Path>) -> eyre::Result<Self> {
        Self::figment_with_root(root).extract().wrap_err("failed to load wallet config")
    }

    #[must_use]
    pub fn with_chain(mut self, chain: ChainConfig) -> Self {
        self.chains.push(chain);
        self
    }

    #[must_use]
    pub fn with_chains(mut self, chains: impl IntoIterator<Item = ChainConfig>) -> Self {
        self.chains = chains.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_rpc_url(mut self, chain_id: ChainId, url: Url) -> Self {
        self.rpc_urls.insert(chain_id, url);
        self
    }

    #[must_use]
    pub fn with_default_rpc_url(mut self, url: Url) -> Self {
        self.default_rpc_url = url;
        self
    }

    #[must_use]
    pub fn with_private_key(mut self, key: B256) -> Self {
        self.private_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn with_dev_accounts(mut self, accounts: DevAccounts) -> Self {
        self.dev_accounts = Some(accounts);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_unknown_methods(mut self, policy: UnknownMethodPolicy) -> Self {
        self.unknown_methods = policy;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = secs;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// The chain that is active when the wallet is created.
    pub fn initial_chain_id(&self) -> ChainId {
        self.chains.first().map_or(DEFAULT_CHAIN_ID, |chain| chain.id)
    }

    pub fn supported_chains(&self) -> SupportedChains {
        if self.chains.is_empty() {
            SupportedChains::Any
        } else {
            SupportedChains::Only(self.chains.iter().map(|chain| chain.id).collect())
        }
    }

    pub fn chain_routes(&self) -> ChainRoutes {
        let mut urls: BTreeMap<_, _> = self
            .chains
            .iter()
            .filter_map(|chain| Some((chain.id, chain.rpc_url.clone()?)))
            .collect();
        urls.extend(self.rpc_urls.iter().map(|(id, url)| (*id, url.clone())));
        ChainRoutes::new(urls, self.default_rpc_url.clone())
    }

    /// Returns the injected dev account table, or derives it from the mnemonic.
    pub fn resolve_dev_accounts(&self) -> eyre::Result<DevAccounts> {
        if let Some(accounts) = &self.dev_accounts {
            return Ok(accounts.clone());
        }
        if self.mnemonic == DEFAULT_MNEMONIC
            && self.derivation_path == DEFAULT_DERIVATION_PATH
            && self.accounts == DEFAULT_ACCOUNT_COUNT
        {
            return DevAccounts::anvil();
        }
        AccountGenerator::new(self.accounts)
            .phrase(self.mnemonic.as_str())
            .derivation_path(self.derivation_path.as_str())
            .generate()
    }

    /// Returns the initial signing identity: the injected signer, the configured private key, or
    /// the first dev account.
    pub fn resolve_signer(&self, accounts: &DevAccounts) -> eyre::Result<Arc<dyn Signer>> {
        if let Some(signer) = &self.signer {
            return Ok(signer.clone());
        }
        let signer = match self.private_key {
            Some(key) => PrivateKeySigner::from_bytes(&key).wrap_err("invalid private key")?,
            None => accounts
                .get(0)
                .cloned()
                .ok_or_else(|| eyre::eyre!("no private key configured and no dev accounts"))?,
        };
        Ok(Arc::new(DevSigner::new(signer).with_timeout(self.request_timeout())))
    }
}

/// (De)serializes a chain id keyed map with string keys, as required by TOML tables.
///
/// Keys are decimal or `0x`-prefixed hex, parsed like chain ids in request params.
mod chain_id_map {
    use super::*;
    use crate::provider::parse_chain_id;
    use serde::{Deserializer, Serializer, de::Error};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<ChainId, Url>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(id, url)| (id.to_string(), url)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ChainId, Url>, D::Error> {
        BTreeMap::<String, Url>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, url)| {
                let id = parse_chain_id(&Value::String(key))
                    .map_err(|err| D::Error::custom(err.to_string()))?;
                Ok((id, url))
            })
            .collect()
    }
}
