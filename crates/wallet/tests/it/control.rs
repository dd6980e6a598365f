use crate::utils::{ACCOUNT_0, ACCOUNT_1, ACCOUNT_9, mock_wallet, record};
use alloy_primitives::{Address, B256};
use headless_wallet::{AccountSelector, ChainConfig, ControlRequest, WalletConfig, WalletError};
use serde_json::{Value, json};

fn multi_chain() -> WalletConfig {
    WalletConfig::default()
        .with_chain(ChainConfig::new(1).with_name("Ethereum"))
        .with_chain(ChainConfig::new(42161).with_name("Arbitrum One"))
}

#[tokio::test(flavor = "multi_thread")]
async fn switch_account_by_index() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let changes = record(&wallet, "accountsChanged");

    assert_eq!(wallet.switch_account(9usize).unwrap(), ACCOUNT_9);
    assert_eq!(wallet.accounts(), vec![ACCOUNT_9]);
    assert_eq!(wallet.switch_account(0usize).unwrap(), ACCOUNT_0);

    let accounts: Vec<Address> =
        serde_json::from_value(wallet.request("eth_accounts", ()).await.unwrap()).unwrap();
    assert_eq!(accounts, vec![ACCOUNT_0]);

    assert_eq!(*changes.lock(), vec![vec![json!([ACCOUNT_9])], vec![json!([ACCOUNT_0])]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn switch_account_rejects_out_of_range() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let changes = record(&wallet, "accountsChanged");

    for index in [json!(-1), json!(10), json!(1.5)] {
        let err = AccountSelector::parse(&index)
            .and_then(|selector| wallet.switch_account(selector))
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)), "{err:?}");
        assert!(err.to_string().starts_with("Invalid Anvil account index"), "{err}");
    }

    assert_eq!(wallet.accounts(), vec![ACCOUNT_0]);
    assert!(changes.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn switch_account_by_address_and_key() {
    let (wallet, _) = mock_wallet(WalletConfig::default());

    wallet.switch_account(ACCOUNT_1).unwrap();
    assert_eq!(wallet.address(), ACCOUNT_1);

    let err = wallet.switch_account(Address::repeat_byte(1)).unwrap_err();
    assert!(matches!(err, WalletError::InvalidInput(_)));
    assert_eq!(wallet.address(), ACCOUNT_1);

    let key: B256 =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".parse().unwrap();
    wallet.switch_account(key).unwrap();
    assert_eq!(wallet.address(), ACCOUNT_0);
}

#[tokio::test(flavor = "multi_thread")]
async fn switch_chain_validates_before_mutating() {
    let (wallet, _) = mock_wallet(multi_chain());
    let changes = record(&wallet, "chainChanged");
    assert_eq!(wallet.chain_id(), 1);

    let err = wallet.switch_chain(10).unwrap_err();
    assert_eq!(err.code(), Some(4902));
    assert!(err.to_string().contains("[1, 42161]"), "{err}");
    assert_eq!(wallet.chain_id(), 1);
    assert!(changes.lock().is_empty());

    let err = wallet
        .request("wallet_switchEthereumChain", vec![json!({"chainId": "0xa"})])
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::UnsupportedChain { chain_id: 10, .. }));
    assert_eq!(wallet.request("eth_chainId", ()).await.unwrap(), json!("0x1"));

    wallet.switch_chain(42161).unwrap();
    assert_eq!(wallet.chain_id(), 42161);
    // switching to the active chain still notifies
    wallet.switch_chain(42161).unwrap();
    assert_eq!(*changes.lock(), vec![vec![json!("0xa4b1")], vec![json!("0xa4b1")]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejection_toggles_do_not_emit() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let accounts = record(&wallet, "accountsChanged");
    let chains = record(&wallet, "chainChanged");

    wallet.set_reject_signature(true);
    wallet.set_reject_transaction(true);
    assert!(wallet.reject_signature());
    assert!(wallet.reject_transaction());

    assert!(accounts.lock().is_empty());
    assert!(chains.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_only_emits() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let disconnects = record(&wallet, "disconnect");
    wallet.request("eth_requestAccounts", ()).await.unwrap();

    wallet.disconnect();

    assert_eq!(
        *disconnects.lock(),
        vec![vec![json!({"code": 4900, "message": "Provider disconnected"})]]
    );
    assert!(wallet.is_connected());
    assert_eq!(wallet.accounts(), vec![ACCOUNT_0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn listeners_can_be_removed() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let hits = std::sync::Arc::new(parking_lot::Mutex::new(0usize));
    let counter = hits.clone();
    let listener: headless_wallet::Listener =
        std::sync::Arc::new(move |_: &[Value]| *counter.lock() += 1);

    wallet.on("accountsChanged", listener.clone());
    wallet.on("accountsChanged", listener.clone());
    wallet.switch_account(1usize).unwrap();
    wallet.remove_listener("accountsChanged", &listener);
    wallet.switch_account(2usize).unwrap();

    assert_eq!(*hits.lock(), 1);
    assert_eq!(wallet.events().listener_count("accountsChanged"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn control_requests() {
    let (wallet, _) = mock_wallet(multi_chain());
    let disconnects = record(&wallet, "disconnect");

    let requests: Vec<ControlRequest> = serde_json::from_value(json!([
        {"method": "switchAccount", "params": ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8"]},
        {"method": "switchChain", "params": ["0xa4b1"]},
        {"method": "setRejectSignature", "params": [true]},
        {"method": "setRejectTransaction", "params": [true]},
        {"method": "disconnect", "params": []}
    ]))
    .unwrap();
    for request in requests {
        wallet.control(request).unwrap();
    }

    assert_eq!(wallet.address(), ACCOUNT_1);
    assert_eq!(wallet.chain_id(), 42161);
    assert!(wallet.reject_signature());
    assert!(wallet.reject_transaction());
    assert_eq!(disconnects.lock().len(), 1);

    let err = wallet.control(ControlRequest::SwitchAccount(json!(10))).unwrap_err();
    assert!(err.to_string().starts_with("Invalid Anvil account index: 10"));
    let err = wallet.control(ControlRequest::SwitchChain(5)).unwrap_err();
    assert_eq!(err.code(), Some(4902));
}

#[tokio::test(flavor = "multi_thread")]
async fn switched_identities_keep_the_request_timeout() {
    let (wallet, _) = mock_wallet(WalletConfig::default().with_request_timeout(5));
    assert!(format!("{:?}", wallet.identity()).contains("timeout: 5s"));

    let key: B256 =
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d".parse().unwrap();
    for selector in [AccountSelector::ByIndex(1), ACCOUNT_9.into(), key.into()] {
        wallet.switch_account(selector).unwrap();
        let identity = wallet.identity();
        assert!(format!("{identity:?}").contains("timeout: 5s"), "{identity:?}");
    }
    assert_eq!(wallet.address(), ACCOUNT_1);
}
