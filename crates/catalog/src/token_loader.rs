use async_trait::async_trait;
use serde::Deserialize;
use shared::{Error, NetworkDefinition, Result, TokenCatalog, TokenInfo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One entry of a `{identifier}.json` token file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenEntry {
    address: String,
    #[serde(default)]
    name: String,
    symbol: String,
    decimals: u8,
    chain_id: u64,
}

/// Token lists stored as one JSON array per network, named after the
/// network identifier (`ethereum.json`, `bsc.json`, ...).
pub struct TokenFileLoader {
    dir: PathBuf,
}

impl TokenFileLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load_file(&self, path: &Path, network: &NetworkDefinition) -> Option<Vec<TokenInfo>> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read token file, skipping");
                return None;
            }
        };

        let entries: Vec<TokenEntry> = match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse token file, skipping");
                return None;
            }
        };

        let tokens: Vec<TokenInfo> = entries
            .into_iter()
            .filter_map(|entry| {
                if entry.chain_id != network.chain_id {
                    warn!(
                        path = %path.display(),
                        token = %entry.symbol,
                        address = %entry.address,
                        token_chain_id = entry.chain_id,
                        expected_chain_id = network.chain_id,
                        "Token has mismatched chain id, skipping"
                    );
                    return None;
                }
                Some(TokenInfo {
                    chain_id: entry.chain_id,
                    address: entry.address.to_lowercase(),
                    name: entry.name,
                    symbol: entry.symbol,
                    decimals: entry.decimals,
                })
            })
            .collect();

        Some(tokens)
    }
}

#[async_trait]
impl TokenCatalog for TokenFileLoader {
    async fn tokens_by_network(
        &self,
        networks: &[NetworkDefinition],
    ) -> Result<HashMap<u64, Vec<TokenInfo>>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            Error::Catalog(format!(
                "Failed to read token directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let active: HashMap<&str, &NetworkDefinition> = networks
            .iter()
            .map(|network| (network.identifier.as_str(), network))
            .collect();

        let mut tokens_by_chain: HashMap<u64, Vec<TokenInfo>> = HashMap::new();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(Error::Catalog(format!(
                        "Failed to list token directory {}: {}",
                        self.dir.display(),
                        e
                    )))
                }
            };

            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if !is_json || path.is_dir() {
                continue;
            }

            let identifier = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            let network = match active.get(identifier.as_str()) {
                Some(network) => *network,
                None => {
                    debug!(file = %path.display(), "Token file for inactive network, skipping");
                    continue;
                }
            };

            if let Some(tokens) = self.load_file(&path, network).await {
                if !tokens.is_empty() {
                    info!(network = %network.identifier, count = tokens.len(), "Loaded tokens");
                    tokens_by_chain.entry(network.chain_id).or_default().extend(tokens);
                }
            }
        }

        Ok(tokens_by_chain)
    }
}
