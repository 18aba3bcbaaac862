use std::path::Path;

use anyhow::Result;

use crate::read_contract_feed;

use super::super::Container;

pub struct ImportController<'a> {
    container: &'a Container,
}

impl<'a> ImportController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn import(&self, path: String) -> Result<String> {
        let feed = read_contract_feed(Path::new(&path))?;
        let summary = self.container.import_use_case().execute(feed).await?;

        Ok(format!(
            "Imported {} customers, {} contracts, {} services from {}",
            summary.customers, summary.contracts, summary.services, path
        ))
    }
}
