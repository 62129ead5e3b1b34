use catalog::{NetworkRegistry, TokenFileLoader, WalletFileLoader};
use shared::{Error, NetworkCatalog, TokenCatalog, WalletSource};
use std::fs;

#[tokio::test]
async fn test_wallet_file_lookup_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    fs::write(
        &path,
        "# team wallets\n0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0\n0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045\n",
    )
    .unwrap();

    let loader = WalletFileLoader::new(&path);
    assert_eq!(loader.wallets().await.unwrap().len(), 2);

    let found = loader
        .wallet_by_address("0xD8DA6BF26964AF9D7EED9E03E53415D37AA96045")
        .await
        .unwrap();
    assert_eq!(found.unwrap().address, "0xd8da6bf26964af9d7eed9e03e53415d37aa96045");

    let missing = loader
        .wallet_by_address("0x0000000000000000000000000000000000000001")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_token_files_for_active_networks() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("ethereum.json"),
        r#"[
            {"address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "name": "USD Coin", "symbol": "USDC", "decimals": 6, "chainId": 1},
            {"address": "0x55d398326f99059ff775485246999027b3197955", "name": "Tether", "symbol": "USDT", "decimals": 18, "chainId": 56}
        ]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("bsc.json"),
        r#"[{"address": "0x55d398326f99059ff775485246999027b3197955", "symbol": "USDT", "decimals": 18, "chainId": 56}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("polygon.json"), "{ not json").unwrap();
    fs::write(dir.path().join("README.md"), "token lists").unwrap();

    let networks = NetworkRegistry::with_active(&["ethereum", "polygon"]).unwrap().networks();
    let loader = TokenFileLoader::new(dir.path());
    let tokens = loader.tokens_by_network(&networks).await.unwrap();

    assert_eq!(tokens.len(), 1);
    let ethereum = &tokens[&1];
    assert_eq!(ethereum.len(), 1);
    assert_eq!(ethereum[0].symbol, "USDC");
    assert_eq!(ethereum[0].address, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    assert!(!tokens.contains_key(&56));
}

#[tokio::test]
async fn test_missing_token_directory_is_catalog_error() {
    let loader = TokenFileLoader::new("/nonexistent/tokens");
    let result = loader.tokens_by_network(&NetworkRegistry::builtin().networks()).await;
    assert!(matches!(result, Err(Error::Catalog(_))));
}
