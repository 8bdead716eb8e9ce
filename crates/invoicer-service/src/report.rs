//! Sales reporting over stored invoices.

use chrono::NaiveDate;
use std::sync::Arc;

use invoicer_core::validation::{validate_date_range, validate_reference};
use invoicer_core::SalesDataPoint;
use invoicer_db::TenantStore;

use crate::error::{AppError, ServiceResult};

/// Read-only reports for one store.
pub struct ReportService<S: TenantStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TenantStore + ?Sized> ReportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        ReportService { store }
    }

    /// Invoice count and total per issue date in `from..=to`, oldest first.
    ///
    /// Days without invoices are omitted. `from` after `to` is a
    /// `VALIDATION_ERROR`.
    pub async fn sales_over_time(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SalesDataPoint>, AppError> {
        self.sales(tenant_id, from, to).await.map_err(AppError::from)
    }

    async fn sales(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<SalesDataPoint>> {
        validate_reference("tenant_id", tenant_id)?;
        validate_date_range(from, to)?;
        Ok(self.store.sales_over_time(tenant_id, from, to).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use invoicer_db::MemoryStore;

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let store = Arc::new(MemoryStore::new());
        let reports = ReportService::new(Arc::clone(&store));

        let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let err = reports.sales_over_time("tenant-a", from, to).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let store = Arc::new(MemoryStore::new());
        let reports = ReportService::new(store);

        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let points = reports.sales_over_time("tenant-a", day, day).await.unwrap();
        assert!(points.is_empty());
    }
}
