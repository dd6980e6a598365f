//! The EIP-1193 request router.

use crate::{
    accounts::{AccountSelector, DevAccounts},
    config::{UnknownMethodPolicy, WalletConfig},
    error::{Rejection, Result, WalletError},
    events::{EventBus, Listener, WalletEvent},
    forward::{HttpTransport, RpcForwarder, RpcTransport},
    logging::CONTROL_TARGET,
    macros::rpc_trace,
    methods::{MethodClass, classify, is_signature_method, is_typed_data_method},
    session::{ActiveChain, Session},
    sign::Signer,
};
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, ChainId, hex};
use alloy_rpc_types_eth::TransactionRequest;
use headless_wallet_rpc::{
    error::{ErrorCode, RpcError},
    request::{RequestParams, RpcMethodCall},
    response::{ResponseResult, RpcResponse},
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use url::Url;

/// A scriptable EIP-1193 provider.
///
/// Cheap to clone, all clones share the same session and listeners.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<WalletInner>,
}

struct WalletInner {
    session: RwLock<Session>,
    events: EventBus,
    forwarder: RpcForwarder,
    dev_accounts: DevAccounts,
    request_counter: AtomicU64,
    /// Transaction submission timeout of identities selected through `switch_account`.
    signer_timeout: Duration,
    debug: bool,
    unknown_methods: UnknownMethodPolicy,
}

impl Wallet {
    /// Creates a wallet from `config`.
    ///
    /// Fails if the configured identity or dev accounts cannot be derived, or the HTTP client
    /// cannot be built.
    pub fn new(config: WalletConfig) -> eyre::Result<Self> {
        let dev_accounts = config.resolve_dev_accounts()?;
        let identity = config.resolve_signer(&dev_accounts)?;
        let transport: Arc<dyn RpcTransport> = match &config.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(HttpTransport::new(config.request_timeout())?),
        };
        let session = Session::new(
            identity,
            config.initial_chain_id(),
            config.supported_chains(),
            config.chain_routes(),
        );

        Ok(Self {
            inner: Arc::new(WalletInner {
                session: RwLock::new(session),
                events: EventBus::default(),
                forwarder: RpcForwarder::new(transport),
                dev_accounts,
                request_counter: AtomicU64::new(0),
                signer_timeout: config.request_timeout(),
                debug: config.debug,
                unknown_methods: config.unknown_methods,
            }),
        })
    }

    /// Handles an EIP-1193 `request({ method, params })` call.
    pub async fn request(&self, method: &str, params: impl Into<RequestParams>) -> Result<Value> {
        let id = self.inner.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let params = params.into();
        let debug = self.inner.debug;
        rpc_trace!(debug, id, method, ?params, "request");

        let res = match classify(method) {
            MethodClass::WalletState => self.wallet_state(method, &params),
            MethodClass::Write => self.write(id, method, params).await,
            MethodClass::Read => self.forward(id, method, params).await,
            MethodClass::Unknown => match self.inner.unknown_methods {
                UnknownMethodPolicy::Forward => self.forward(id, method, params).await,
                UnknownMethodPolicy::Reject => {
                    Err(WalletError::UnsupportedMethod(method.to_string()))
                }
            },
        };

        match &res {
            Ok(value) => rpc_trace!(debug, id, method, result = %value, "response"),
            Err(err) => rpc_trace!(debug, id, method, code = ?err.code(), %err, "request failed"),
        }
        res
    }

    /// Handles a JSON-RPC method call, errors are returned in the envelope.
    pub async fn request_json(&self, call: RpcMethodCall) -> RpcResponse {
        let id = call.id();
        let result = match self.request(&call.method, call.params).await {
            Ok(value) => ResponseResult::Success(value),
            Err(err) => ResponseResult::Error(err.to_rpc_error()),
        };
        RpcResponse::new(id, result)
    }

    fn wallet_state(&self, method: &str, params: &RequestParams) -> Result<Value> {
        match method {
            "eth_accounts" => Ok(json!(self.accounts())),
            "eth_chainId" => Ok(json!(hex_chain_id(self.chain_id()))),
            "net_version" => Ok(json!(self.chain_id().to_string())),
            "eth_requestAccounts" => {
                let (connected, accounts, chain_id) = {
                    let mut session = self.inner.session.write();
                    (session.connect(), session.accounts().to_vec(), session.chain().id)
                };
                if connected {
                    debug!(target: CONTROL_TARGET, ?accounts, chain_id, "connected");
                    self.emit(WalletEvent::Connect, &[json!({ "chainId": hex_chain_id(chain_id) })]);
                }
                Ok(json!(accounts))
            }
            "wallet_switchEthereumChain" => {
                let chain_id = params
                    .get(0)
                    .and_then(|param| param.get("chainId"))
                    .ok_or_else(|| WalletError::invalid_params("missing chainId"))
                    .and_then(parse_chain_id)?;
                self.switch_chain(chain_id)?;
                Ok(Value::Null)
            }
            "wallet_getPermissions" | "wallet_requestPermissions" => {
                Ok(json!([{ "parentCapability": "eth_accounts", "caveats": [] }]))
            }
            "wallet_watchAsset" => Ok(Value::Bool(true)),
            // "wallet_addEthereumChain" | "wallet_revokePermissions"
            _ => Ok(Value::Null),
        }
    }

    async fn write(&self, id: u64, method: &str, params: RequestParams) -> Result<Value> {
        match method {
            // already signed, nothing to reject
            "eth_sendRawTransaction" => self.forward(id, method, params).await,
            "eth_sendTransaction" => {
                let (signer, chain) = self.signing_context(Rejection::Transaction)?;
                let tx = transaction_request(&params, signer.address(), chain.id)?;
                let hash = signer.send_transaction(&chain, tx).await?;
                Ok(json!(hash))
            }
            method if is_signature_method(method) => {
                let (signer, _) = self.signing_context(Rejection::Signature)?;
                let signature = if is_typed_data_method(method) {
                    signer.sign_typed_data(&typed_data(&params)?).await?
                } else {
                    // personal_sign is [message, address], eth_sign is [address, message]
                    let message =
                        if method == "personal_sign" { params.get(0) } else { params.get(1) };
                    signer.sign_message(&message_bytes(message)?).await?
                };
                Ok(json!(hex::encode_prefixed(signature.as_bytes())))
            }
            _ => Err(WalletError::UnsupportedMethod(method.to_string())),
        }
    }

    async fn forward(&self, id: u64, method: &str, params: RequestParams) -> Result<Value> {
        let url = self.inner.session.read().chain().rpc_url.clone();
        self.inner.forwarder.send(&url, method, params, id).await
    }

    /// Snapshots the identity and chain for a signing request, unless rejection is enabled.
    fn signing_context(&self, kind: Rejection) -> Result<(Arc<dyn Signer>, ActiveChain)> {
        let session = self.inner.session.read();
        let rejected = match kind {
            Rejection::Signature => session.reject_signature(),
            Rejection::Transaction => session.reject_transaction(),
        };
        if rejected {
            return Err(WalletError::Rejected(kind));
        }
        Ok((session.identity().clone(), session.chain().clone()))
    }

    /// Makes another account the active one and emits `accountsChanged`.
    pub fn switch_account(&self, selector: impl Into<AccountSelector>) -> Result<Address> {
        let identity =
            selector.into().resolve(&self.inner.dev_accounts, self.inner.signer_timeout)?;
        let address = self.inner.session.write().set_identity(identity);
        debug!(target: CONTROL_TARGET, %address, "switched account");
        self.emit(WalletEvent::AccountsChanged, &[json!([address])]);
        Ok(address)
    }

    /// Makes `chain_id` the active chain and emits `chainChanged`.
    ///
    /// Fails with [`WalletError::UnsupportedChain`] if the chain is not configured, the session
    /// is left unchanged in that case.
    pub fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        let chain = self.inner.session.write().switch_chain(chain_id)?.clone();
        debug!(target: CONTROL_TARGET, chain_id, rpc_url = %chain.rpc_url, "switched chain");
        self.emit(WalletEvent::ChainChanged, &[json!(hex_chain_id(chain_id))]);
        Ok(())
    }

    /// Makes all signature requests fail with a user rejection.
    pub fn set_reject_signature(&self, reject: bool) {
        self.inner.session.write().set_reject_signature(reject);
        debug!(target: CONTROL_TARGET, reject, "reject signature");
    }

    /// Makes all `eth_sendTransaction` requests fail with a user rejection.
    pub fn set_reject_transaction(&self, reject: bool) {
        self.inner.session.write().set_reject_transaction(reject);
        debug!(target: CONTROL_TARGET, reject, "reject transaction");
    }

    /// Emits `disconnect`, the session itself is kept.
    pub fn disconnect(&self) {
        debug!(target: CONTROL_TARGET, "disconnect");
        let error = RpcError::with_message(ErrorCode::Disconnected, "Provider disconnected");
        self.emit(WalletEvent::Disconnect, &[json!(error)]);
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.inner.session.read().accounts().to_vec()
    }

    /// The active signing identity.
    pub fn identity(&self) -> Arc<dyn Signer> {
        self.inner.session.read().identity().clone()
    }

    pub fn address(&self) -> Address {
        self.inner.session.read().identity().address()
    }

    pub fn chain_id(&self) -> ChainId {
        self.inner.session.read().chain().id
    }

    pub fn active_chain(&self) -> ActiveChain {
        self.inner.session.read().chain().clone()
    }

    /// Endpoint of the active chain.
    pub fn rpc_url(&self) -> Url {
        self.inner.session.read().chain().rpc_url.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.read().is_connected()
    }

    pub fn reject_signature(&self) -> bool {
        self.inner.session.read().reject_signature()
    }

    pub fn reject_transaction(&self) -> bool {
        self.inner.session.read().reject_transaction()
    }

    /// Number of requests handled so far.
    pub fn request_count(&self) -> u64 {
        self.inner.request_counter.load(Ordering::Relaxed)
    }

    pub fn dev_accounts(&self) -> &DevAccounts {
        &self.inner.dev_accounts
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn on(&self, event: impl AsRef<str>, listener: Listener) {
        self.inner.events.on(event, listener)
    }

    pub fn remove_listener(&self, event: impl AsRef<str>, listener: &Listener) {
        self.inner.events.remove_listener(event, listener)
    }

    /// Emits `event` to its listeners, returns `true` if there were any.
    pub fn emit(&self, event: impl AsRef<str>, args: &[Value]) -> bool {
        self.inner.events.emit(event, args)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("session", &*self.inner.session.read())
            .field("events", &self.inner.events)
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}

fn hex_chain_id(chain_id: ChainId) -> String {
    format!("{chain_id:#x}")
}

/// Parses a chain id given as a `0x` hex string, a decimal string or a number.
pub(crate) fn parse_chain_id(value: &Value) -> Result<ChainId> {
    let parsed = match value {
        Value::Number(num) => num.as_u64(),
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => ChainId::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| WalletError::invalid_params(format!("invalid chain id: {value}")))
}

/// Converts a message parameter to the bytes to sign.
///
/// `0x` hex is decoded, anything else is signed as UTF-8.
fn message_bytes(message: Option<&Value>) -> Result<Vec<u8>> {
    let message = message
        .and_then(Value::as_str)
        .ok_or_else(|| WalletError::invalid_params("message must be a string"))?;
    if message.starts_with("0x")
        && let Ok(bytes) = hex::decode(message)
    {
        return Ok(bytes);
    }
    Ok(message.as_bytes().to_vec())
}

/// Extracts the typed data payload, the parameter that is not the signing address.
fn typed_data(params: &RequestParams) -> Result<TypedData> {
    let payload = params
        .as_array()
        .iter()
        .find(|param| !param.as_str().is_some_and(|s| s.parse::<Address>().is_ok()))
        .ok_or_else(|| WalletError::invalid_params("missing typed data"))?;

    let parsed = match payload {
        Value::String(s) => serde_json::from_str(s),
        other => serde_json::from_value(other.clone()),
    };
    parsed.map_err(|err| WalletError::invalid_params(format!("invalid typed data: {err}")))
}

/// Builds the transaction request sent from `from` on `chain_id`.
fn transaction_request(
    params: &RequestParams,
    from: Address,
    chain_id: ChainId,
) -> Result<TransactionRequest> {
    let tx = params.get(0).ok_or_else(|| WalletError::invalid_params("missing transaction"))?;
    let mut tx: TransactionRequest = serde_json::from_value(tx.clone())
        .map_err(|err| WalletError::invalid_params(format!("invalid transaction: {err}")))?;

    tx.from = Some(from);
    tx.chain_id = Some(chain_id);
    // legacy pricing wins over EIP-1559 fees
    if tx.gas_price.is_some() {
        tx.max_fee_per_gas = None;
        tx.max_priority_fee_per_gas = None;
        tx.transaction_type = None;
    }
    Ok(tx)
}
