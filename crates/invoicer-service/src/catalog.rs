//! # Catalog Service
//!
//! Companies (tenants), customers and products: the reference data invoices
//! are built from.
//!
//! ```text
//! register_company ─► companies
//!                       │ tenant_id
//!           ┌───────────┴───────────┐
//!           ▼                       ▼
//!       customers               products
//!           │                       │
//!           └──── invoices ◄────────┘  (customer delete blocked while referenced)
//! ```
//!
//! Every customer and product operation is scoped to the tenant given; a
//! record owned by another tenant is reported as not found.
//!
//! In point-of-sale mode the walk-in customer name is reserved: no customer
//! can be created with it or renamed to it.

use tracing::info;

use invoicer_core::validation::{
    validate_customer_patch, validate_new_company, validate_new_customer, validate_new_product,
    validate_not_reserved, validate_product_patch, validate_reference,
};
use invoicer_core::{
    Company, Customer, CustomerPatch, NewCompany, NewCustomer, NewProduct, Product, ProductPatch,
};
use invoicer_db::{Database, DbError};

use crate::error::{AppError, ServiceError, ServiceResult};

/// Reference data management on top of the SQLite database.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    reserved_customer_name: Option<String>,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService {
            db,
            reserved_customer_name: None,
        }
    }

    /// Refuses customers named `name`, the one walk-in sales resolve to.
    pub fn with_reserved_customer_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_customer_name = Some(name.into());
        self
    }

    // =========================================================================
    // Companies
    // =========================================================================

    /// Registers a company. Its id is the tenant id for everything else.
    pub async fn register_company(&self, input: &NewCompany) -> Result<Company, AppError> {
        let run = async {
            validate_new_company(input)?;
            let company = self.db.companies().create(input).await?;
            info!(tenant_id = %company.id, name = %company.name, "Company registered");
            Ok::<_, ServiceError>(company)
        };
        finish(run.await)
    }

    pub async fn get_company(&self, company_id: &str) -> Result<Company, AppError> {
        let run = async {
            validate_reference("company_id", company_id)?;
            self.db
                .companies()
                .get_by_id(company_id)
                .await?
                .ok_or_else(|| ServiceError::CompanyNotFound(company_id.to_string()))
        };
        finish(run.await)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Creates a customer. An unknown tenant is `NOT_FOUND`.
    pub async fn create_customer(
        &self,
        tenant_id: &str,
        input: &NewCustomer,
    ) -> Result<Customer, AppError> {
        let run = async {
            validate_reference("tenant_id", tenant_id)?;
            validate_new_customer(input)?;
            self.check_customer_name(&input.name)?;
            let customer = self
                .db
                .customers()
                .create(tenant_id, input)
                .await
                .map_err(|e| unknown_tenant(e, tenant_id))?;
            info!(tenant_id = %tenant_id, customer_id = %customer.id, "Customer created");
            Ok::<_, ServiceError>(customer)
        };
        finish(run.await)
    }

    pub async fn get_customer(&self, tenant_id: &str, customer_id: &str) -> Result<Customer, AppError> {
        finish(self.find_customer(tenant_id, customer_id).await)
    }

    /// Lists the tenant's customers, newest first.
    pub async fn list_customers(&self, tenant_id: &str) -> Result<Vec<Customer>, AppError> {
        let run = async {
            validate_reference("tenant_id", tenant_id)?;
            Ok::<_, ServiceError>(self.db.customers().list(tenant_id).await?)
        };
        finish(run.await)
    }

    /// Applies a partial update. An empty patch returns the customer unchanged.
    pub async fn update_customer(
        &self,
        tenant_id: &str,
        customer_id: &str,
        patch: &CustomerPatch,
    ) -> Result<Customer, AppError> {
        let run = async {
            validate_customer_patch(patch)?;
            if let Some(name) = patch.name.as_deref() {
                self.check_customer_name(name)?;
            }
            if patch.is_empty() {
                return self.find_customer(tenant_id, customer_id).await;
            }
            validate_reference("tenant_id", tenant_id)?;
            validate_reference("customer_id", customer_id)?;
            self.db
                .customers()
                .update(tenant_id, customer_id, patch)
                .await
                .map_err(|e| missing_as(e, ServiceError::CustomerNotFound(customer_id.to_string())))
        };
        finish(run.await)
    }

    /// Deletes a customer. A customer with invoices is a `CONFLICT`.
    pub async fn delete_customer(&self, tenant_id: &str, customer_id: &str) -> Result<(), AppError> {
        let run = async {
            validate_reference("tenant_id", tenant_id)?;
            validate_reference("customer_id", customer_id)?;
            self.db
                .customers()
                .delete(tenant_id, customer_id)
                .await
                .map_err(|e| match e {
                    DbError::ForeignKeyViolation { .. } => ServiceError::Conflict(
                        "Customer has invoices and cannot be deleted".to_string(),
                    ),
                    other => missing_as(other, ServiceError::CustomerNotFound(customer_id.to_string())),
                })?;
            info!(tenant_id = %tenant_id, customer_id = %customer_id, "Customer deleted");
            Ok::<_, ServiceError>(())
        };
        finish(run.await)
    }

    fn check_customer_name(&self, name: &str) -> ServiceResult<()> {
        match &self.reserved_customer_name {
            Some(reserved) => Ok(validate_not_reserved("name", name, reserved)?),
            None => Ok(()),
        }
    }

    async fn find_customer(&self, tenant_id: &str, customer_id: &str) -> ServiceResult<Customer> {
        validate_reference("tenant_id", tenant_id)?;
        validate_reference("customer_id", customer_id)?;
        self.db
            .customers()
            .get_by_id(tenant_id, customer_id)
            .await?
            .ok_or_else(|| ServiceError::CustomerNotFound(customer_id.to_string()))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product. An unknown tenant is `NOT_FOUND`.
    pub async fn create_product(
        &self,
        tenant_id: &str,
        input: &NewProduct,
    ) -> Result<Product, AppError> {
        let run = async {
            validate_reference("tenant_id", tenant_id)?;
            validate_new_product(input)?;
            let product = self
                .db
                .products()
                .create(tenant_id, input)
                .await
                .map_err(|e| unknown_tenant(e, tenant_id))?;
            info!(
                tenant_id = %tenant_id,
                product_id = %product.id,
                price = %product.unit_price(),
                "Product created"
            );
            Ok::<_, ServiceError>(product)
        };
        finish(run.await)
    }

    pub async fn get_product(&self, tenant_id: &str, product_id: &str) -> Result<Product, AppError> {
        finish(self.find_product(tenant_id, product_id).await)
    }

    /// Lists the tenant's products by name.
    pub async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, AppError> {
        let run = async {
            validate_reference("tenant_id", tenant_id)?;
            Ok::<_, ServiceError>(self.db.products().list(tenant_id).await?)
        };
        finish(run.await)
    }

    /// Applies a partial update. Existing invoice lines keep their prices.
    pub async fn update_product(
        &self,
        tenant_id: &str,
        product_id: &str,
        patch: &ProductPatch,
    ) -> Result<Product, AppError> {
        let run = async {
            validate_product_patch(patch)?;
            if patch.is_empty() {
                return self.find_product(tenant_id, product_id).await;
            }
            validate_reference("tenant_id", tenant_id)?;
            validate_reference("product_id", product_id)?;
            self.db
                .products()
                .update(tenant_id, product_id, patch)
                .await
                .map_err(|e| missing_as(e, ServiceError::ProductNotFound(product_id.to_string())))
        };
        finish(run.await)
    }

    async fn find_product(&self, tenant_id: &str, product_id: &str) -> ServiceResult<Product> {
        validate_reference("tenant_id", tenant_id)?;
        validate_reference("product_id", product_id)?;
        self.db
            .products()
            .get_by_id(tenant_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.to_string()))
    }
}

fn finish<T>(result: ServiceResult<T>) -> Result<T, AppError> {
    result.map_err(AppError::from)
}

/// Rows hang off the tenant, so a foreign key failure on insert means the
/// company does not exist.
fn unknown_tenant(err: DbError, tenant_id: &str) -> ServiceError {
    match err {
        DbError::ForeignKeyViolation { .. } => ServiceError::CompanyNotFound(tenant_id.to_string()),
        other => ServiceError::Persistence(other),
    }
}

fn missing_as(err: DbError, not_found: ServiceError) -> ServiceError {
    match err {
        DbError::NotFound { .. } => not_found,
        other => ServiceError::Persistence(other),
    }
}
