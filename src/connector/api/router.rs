use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    GenerateController, ImportController, InvoicesController, StatsController,
};

pub struct Router<'a> {
    generate_controller: GenerateController<'a>,
    import_controller: ImportController<'a>,
    invoices_controller: InvoicesController<'a>,
    stats_controller: StatsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            generate_controller: GenerateController::new(container),
            import_controller: ImportController::new(container),
            invoices_controller: InvoicesController::new(container),
            stats_controller: StatsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            // `--today` is applied when the container's clock is built.
            Commands::Generate { today: _, dry_run } => {
                self.generate_controller.generate(dry_run).await
            }
            Commands::Import { path } => self.import_controller.import(path).await,
            Commands::Invoices { contract, month } => {
                self.invoices_controller.list(contract, month).await
            }
            Commands::Stats => self.stats_controller.stats().await,
        }
    }
}
