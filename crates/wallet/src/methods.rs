//! Static classification of JSON-RPC method names.

use std::{collections::HashSet, sync::LazyLock};

/// Methods answered from the local session, never forwarded.
static WALLET_STATE_METHODS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "eth_accounts",
        "eth_chainId",
        "net_version",
        "eth_requestAccounts",
        "wallet_switchEthereumChain",
        "wallet_addEthereumChain",
        "wallet_getPermissions",
        "wallet_requestPermissions",
        "wallet_revokePermissions",
        "wallet_watchAsset",
    ])
});

/// Methods that need the signing identity.
static WRITE_METHODS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "eth_sendTransaction",
        "eth_sendRawTransaction",
        "eth_signTransaction",
        "personal_sign",
        "eth_sign",
        "eth_signTypedData",
        "eth_signTypedData_v3",
        "eth_signTypedData_v4",
    ])
});

static READ_METHODS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "eth_blockNumber",
        "eth_getBalance",
        "eth_call",
        "eth_estimateGas",
        "eth_gasPrice",
        "eth_maxPriorityFeePerGas",
        "eth_blobBaseFee",
        "eth_feeHistory",
        "eth_getLogs",
        "eth_getCode",
        "eth_getStorageAt",
        "eth_getTransactionCount",
        "eth_getTransactionReceipt",
        "eth_getTransactionByHash",
        "eth_getTransactionByBlockHashAndIndex",
        "eth_getTransactionByBlockNumberAndIndex",
        "eth_getBlockByNumber",
        "eth_getBlockByHash",
        "eth_getBlockTransactionCountByHash",
        "eth_getBlockTransactionCountByNumber",
        "eth_getBlockReceipts",
        "eth_getProof",
        "eth_syncing",
        "eth_createAccessList",
        "eth_newFilter",
        "eth_newBlockFilter",
        "eth_getFilterChanges",
        "eth_getFilterLogs",
        "eth_uninstallFilter",
        "web3_clientVersion",
        "web3_sha3",
        "net_listening",
        "net_peerCount",
    ])
});

/// Behavioral class of a method name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodClass {
    /// Answered from session state.
    WalletState,
    /// Signs locally, or submits signed data.
    Write,
    /// Forwarded to the active chain's node.
    Read,
    /// Not in any table.
    Unknown,
}

/// Classifies `method`, checking the wallet-state table first, then the write table.
pub fn classify(method: &str) -> MethodClass {
    if WALLET_STATE_METHODS.contains(method) {
        MethodClass::WalletState
    } else if WRITE_METHODS.contains(method) {
        MethodClass::Write
    } else if READ_METHODS.contains(method) {
        MethodClass::Read
    } else {
        MethodClass::Unknown
    }
}

/// Whether `method` produces a signature over a message or typed data.
pub fn is_signature_method(method: &str) -> bool {
    matches!(method, "personal_sign" | "eth_sign") || is_typed_data_method(method)
}

pub fn is_typed_data_method(method: &str) -> bool {
    matches!(method, "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4")
}
