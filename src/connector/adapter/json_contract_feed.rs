use std::path::Path;

use tracing::debug;

use crate::application::ContractFeed;
use crate::domain::DomainError;

/// Reads a contract feed from a JSON file.
pub fn read_contract_feed(path: &Path) -> Result<ContractFeed, DomainError> {
    let raw = std::fs::read_to_string(path)?;
    let feed: ContractFeed = serde_json::from_str(&raw).map_err(|e| {
        DomainError::invalid_input(format!(
            "Failed to parse contract feed {}: {}",
            path.display(),
            e
        ))
    })?;

    debug!(
        "Read {} customers from {}",
        feed.customers.len(),
        path.display()
    );
    Ok(feed)
}
