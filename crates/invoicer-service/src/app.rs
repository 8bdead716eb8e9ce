//! Wiring of the services over one database.

use std::sync::Arc;
use tracing::info;

use invoicer_core::InvoicingMode;
use invoicer_db::{Database, DbResult};

use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::invoice_service::InvoiceService;
use crate::report::ReportService;

/// Every service of the application, sharing one connection pool.
pub struct Services {
    pub db: Database,
    pub invoices: InvoiceService<Database>,
    pub reports: ReportService<Database>,
    pub catalog: CatalogService,
}

impl Services {
    /// Opens the database named by the configuration and builds the services.
    pub async fn connect(config: &AppConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!(
            path = ?config.database_path,
            mode = %config.mode,
            "Database connected and migrations applied"
        );
        Ok(Self::with_database(db, config))
    }

    /// Builds the services over an already opened database.
    pub fn with_database(db: Database, config: &AppConfig) -> Self {
        let store = Arc::new(db.clone());
        let mut catalog = CatalogService::new(db.clone());
        if config.mode == InvoicingMode::PointOfSale {
            catalog = catalog.with_reserved_customer_name(config.walk_in_customer_name.clone());
        }
        Services {
            invoices: InvoiceService::new(Arc::clone(&store), config.policy())
                .with_persist_timeout(config.persist_timeout()),
            reports: ReportService::new(store),
            catalog,
            db,
        }
    }
}
