use async_trait::async_trait;
use shared::{Error, Result, Wallet, WalletSource};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Wallet list stored as a text file, one address per line.
///
/// Blank lines and `#` comments are ignored. Malformed addresses are
/// skipped with a warning; duplicates keep their first position.
pub struct WalletFileLoader {
    path: PathBuf,
}

impl WalletFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse wallet file contents into canonical, de-duplicated wallets
pub fn parse_wallets(contents: &str) -> Vec<Wallet> {
    let mut seen = HashSet::new();
    let mut wallets = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Wallet::parse(line) {
            Ok(wallet) => {
                if seen.insert(wallet.address.clone()) {
                    wallets.push(wallet);
                }
            }
            Err(e) => warn!(line = index + 1, error = %e, "Skipping invalid wallet address"),
        }
    }

    wallets
}

#[async_trait]
impl WalletSource for WalletFileLoader {
    async fn wallets(&self) -> Result<Vec<Wallet>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Catalog(format!(
                "Failed to read wallet file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let wallets = parse_wallets(&contents);
        debug!(path = %self.path.display(), count = wallets.len(), "Loaded wallets");
        Ok(wallets)
    }
}
