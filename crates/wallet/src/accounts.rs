//! The well-known development accounts and account selection.

use crate::{
    error::{Result, WalletError},
    sign::{DevSigner, Signer},
};
use alloy_primitives::{Address, B256};
use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, LazyLock},
    time::Duration,
};

/// The mnemonic anvil derives its dev accounts from.
pub const DEFAULT_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/";

/// Number of dev accounts anvil creates by default.
pub const DEFAULT_ACCOUNT_COUNT: usize = 10;

static ANVIL_ACCOUNTS: LazyLock<Result<DevAccounts, String>> = LazyLock::new(|| {
    AccountGenerator::new(DEFAULT_ACCOUNT_COUNT)
        .phrase(DEFAULT_MNEMONIC)
        .generate()
        .map_err(|err| err.to_string())
});

/// Derives dev accounts from a mnemonic
#[derive(Clone, Debug)]
pub struct AccountGenerator {
    amount: usize,
    phrase: String,
    derivation_path: Option<String>,
}

impl AccountGenerator {
    pub fn new(amount: usize) -> Self {
        Self { amount, phrase: DEFAULT_MNEMONIC.to_string(), derivation_path: None }
    }

    #[must_use]
    pub fn phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = phrase.into();
        self
    }

    #[must_use]
    pub fn derivation_path(mut self, derivation_path: impl Into<String>) -> Self {
        let mut derivation_path = derivation_path.into();
        if !derivation_path.ends_with('/') {
            derivation_path.push('/');
        }
        self.derivation_path = Some(derivation_path);
        self
    }

    fn get_derivation_path(&self) -> &str {
        self.derivation_path.as_deref().unwrap_or(DEFAULT_DERIVATION_PATH)
    }

    pub fn generate(&self) -> eyre::Result<DevAccounts> {
        let builder = MnemonicBuilder::<English>::default().phrase(self.phrase.as_str());
        let derivation_path = self.get_derivation_path();

        let mut signers = Vec::with_capacity(self.amount);
        for idx in 0..self.amount {
            let signer =
                builder.clone().derivation_path(format!("{derivation_path}{idx}"))?.build()?;
            signers.push(signer);
        }
        Ok(DevAccounts::new(signers))
    }
}

/// An ordered, cheaply cloneable table of dev account keys.
#[derive(Clone)]
pub struct DevAccounts(Arc<Vec<PrivateKeySigner>>);

impl DevAccounts {
    pub fn new(signers: Vec<PrivateKeySigner>) -> Self {
        Self(Arc::new(signers))
    }

    /// The ten accounts of a default anvil node.
    pub fn anvil() -> eyre::Result<Self> {
        ANVIL_ACCOUNTS.clone().map_err(|err| eyre::eyre!("failed to derive dev accounts: {err}"))
    }

    pub fn get(&self, index: usize) -> Option<&PrivateKeySigner> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.0.iter().map(|signer| signer.address())
    }

    pub fn find(&self, address: Address) -> Option<&PrivateKeySigner> {
        self.0.iter().find(|signer| signer.address() == address)
    }
}

impl fmt::Debug for DevAccounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.addresses()).finish()
    }
}

/// Selects the identity to switch the active account to.
#[derive(Clone, Debug)]
pub enum AccountSelector {
    /// Index into the dev account table.
    ByIndex(i64),
    /// One of the dev accounts, by address.
    ByAddress(Address),
    ByPrivateKey(B256),
    /// An externally constructed identity.
    ByIdentity(Arc<dyn Signer>),
}

impl AccountSelector {
    /// Interprets a primitive JSON value.
    ///
    /// Integers select by index, `0x`-prefixed strings of 66 characters are private keys and of
    /// 42 characters addresses.
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::Number(num) => match num.as_i64() {
                Some(index) => Ok(Self::ByIndex(index)),
                None => Err(invalid_index(num)),
            },
            Value::String(s) if s.starts_with("0x") && s.len() == 66 => s
                .parse()
                .map(Self::ByPrivateKey)
                .map_err(|_| WalletError::invalid_input(format!("Invalid private key: {s}"))),
            Value::String(s) if s.starts_with("0x") && s.len() == 42 => s
                .parse()
                .map(Self::ByAddress)
                .map_err(|_| WalletError::invalid_input(format!("Invalid address: {s}"))),
            other => Err(WalletError::invalid_input(format!(
                "Invalid account: {other}. Expected a dev account index, an address or a private key"
            ))),
        }
    }

    /// Resolves the selector into a signing identity.
    ///
    /// Keys from the dev account table or a raw private key become a [`DevSigner`] that submits
    /// transactions within `timeout`.
    pub fn resolve(self, accounts: &DevAccounts, timeout: Duration) -> Result<Arc<dyn Signer>> {
        let signer = match self {
            Self::ByIdentity(identity) => return Ok(identity),
            Self::ByIndex(index) => usize::try_from(index)
                .ok()
                .and_then(|idx| accounts.get(idx))
                .cloned()
                .ok_or_else(|| account_index_error(index, accounts.len()))?,
            Self::ByAddress(address) => accounts.find(address).cloned().ok_or_else(|| {
                WalletError::invalid_input(format!("Address {address} is not a known dev account"))
            })?,
            Self::ByPrivateKey(key) => PrivateKeySigner::from_bytes(&key)
                .map_err(|err| WalletError::invalid_input(format!("Invalid private key: {err}")))?,
        };
        Ok(Arc::new(DevSigner::new(signer).with_timeout(timeout)))
    }
}

impl From<usize> for AccountSelector {
    fn from(index: usize) -> Self {
        Self::ByIndex(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<Address> for AccountSelector {
    fn from(address: Address) -> Self {
        Self::ByAddress(address)
    }
}

impl From<B256> for AccountSelector {
    fn from(key: B256) -> Self {
        Self::ByPrivateKey(key)
    }
}

impl From<Arc<dyn Signer>> for AccountSelector {
    fn from(identity: Arc<dyn Signer>) -> Self {
        Self::ByIdentity(identity)
    }
}

fn account_index_error(index: impl fmt::Display, len: usize) -> WalletError {
    WalletError::invalid_input(format!(
        "Invalid Anvil account index: {index}. Must be between 0 and {}",
        len.saturating_sub(1)
    ))
}

fn invalid_index(index: impl fmt::Display) -> WalletError {
    account_index_error(index, DEFAULT_ACCOUNT_COUNT)
}
