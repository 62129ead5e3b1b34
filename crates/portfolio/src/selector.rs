use shared::{Error, NetworkDefinition, Result};

/// Selector meaning "every network in the catalog"
pub const ALL_NETWORKS: &str = "all";

/// Resolve user-supplied network selectors against the catalog.
///
/// An empty selector list, or one containing `all`, selects every catalog
/// entry. Otherwise each selector must match a network's display name,
/// identifier or chain id (case-insensitive); duplicates collapse to the
/// first occurrence. Any unmatched selector fails the whole resolution.
pub fn resolve_networks(
    catalog: &[NetworkDefinition],
    selectors: &[String],
) -> Result<Vec<NetworkDefinition>> {
    let selectors: Vec<&str> = selectors
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if selectors.is_empty() || selectors.iter().any(|s| s.eq_ignore_ascii_case(ALL_NETWORKS)) {
        return Ok(catalog.to_vec());
    }

    let mut resolved: Vec<NetworkDefinition> = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let network = catalog
            .iter()
            .find(|network| matches_selector(network, selector))
            .ok_or_else(|| Error::UnknownNetwork(selector.to_string()))?;

        if !resolved.iter().any(|n| n.chain_id == network.chain_id) {
            resolved.push(network.clone());
        }
    }

    Ok(resolved)
}

fn matches_selector(network: &NetworkDefinition, selector: &str) -> bool {
    network.name.eq_ignore_ascii_case(selector)
        || network.identifier.eq_ignore_ascii_case(selector)
        || network.chain_id.to_string() == selector
}
