//! A scriptable [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) wallet provider for dapp
//! end-to-end tests.
//!
//! Account and chain queries are answered from a local session, signing requests are handled
//! with a local key and everything else is forwarded to the JSON-RPC endpoint of the active
//! chain, usually an anvil node.
//!
//! ```no_run
//! use headless_wallet::{Wallet, WalletConfig};
//!
//! # async fn example() -> eyre::Result<()> {
//! let wallet = Wallet::new(WalletConfig::default())?;
//! let accounts = wallet.request("eth_requestAccounts", ()).await?;
//! wallet.switch_account(1usize)?;
//! wallet.set_reject_signature(true);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate tracing;

mod macros;

pub mod accounts;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod forward;
pub mod logging;
pub mod methods;
pub mod provider;
pub mod serde_helpers;
pub mod session;
pub mod sign;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod server;

pub use accounts::{AccountSelector, DevAccounts};
pub use config::{ChainConfig, UnknownMethodPolicy, WalletConfig};
pub use control::ControlRequest;
pub use error::{Rejection, TransportError, WalletError};
pub use events::{EventBus, Listener, WalletEvent};
pub use provider::Wallet;
pub use sign::{DevSigner, Signer};

pub use headless_wallet_rpc as rpc;
