//! # Product Repository
//!
//! Database operations for products.
//!
//! A product's `unit_price_cents` is the price new invoice lines are built
//! from. Editing a product never touches existing invoice items, which carry
//! their own snapshot.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::non_blank;
use crate::error::{DbError, DbResult};
use invoicer_core::{NewProduct, Product, ProductPatch};

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, description, unit_price_cents, image_url, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_id(&tenant_id, &product_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product from a validated payload.
    pub async fn create(&self, tenant_id: &str, input: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: input.name.trim().to_string(),
            description: non_blank(input.description.as_deref()),
            unit_price_cents: input.unit_price_cents,
            image_url: non_blank(input.image_url.as_deref()),
            created_at: now,
            updated_at: now,
        };

        debug!(
            tenant_id = %tenant_id,
            id = %product.id,
            price = product.unit_price_cents,
            "Creating product"
        );

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, name, description, unit_price_cents, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by id within a tenant.
    ///
    /// A product owned by another tenant yields `None`, exactly like a
    /// missing one.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE tenant_id = ?1 AND id = ?2",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists a tenant's products ordered by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE tenant_id = ?1 ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Applies a partial update and returns the updated row.
    pub async fn update(&self, tenant_id: &str, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(non_blank(Some(description)));
        }
        if let Some(price) = patch.unit_price_cents {
            qb.push(", unit_price_cents = ").push_bind(price);
        }
        if let Some(image_url) = &patch.image_url {
            qb.push(", image_url = ").push_bind(non_blank(Some(image_url)));
        }

        qb.push(" WHERE tenant_id = ")
            .push_bind(tenant_id.to_string())
            .push(" AND id = ")
            .push_bind(id.to_string());

        debug!(tenant_id = %tenant_id, id = %id, "Updating product");

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use invoicer_core::NewCompany;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company = db
            .companies()
            .create(&NewCompany {
                name: "Tenant".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, company.id)
    }

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            unit_price_cents: price,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let (db, tenant) = setup().await;
        let repo = db.products();

        repo.create(&tenant, &new_product("Zeta", 100)).await.unwrap();
        let alpha = repo.create(&tenant, &new_product("Alpha", 4_999)).await.unwrap();

        let fetched = repo.get_by_id(&tenant, &alpha.id).await.unwrap().unwrap();
        assert_eq!(fetched.unit_price_cents, 4_999);

        let names: Vec<String> = repo
            .list(&tenant)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        assert!(repo.get_by_id("other-tenant", &alpha.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_positive_price_rejected_by_schema() {
        let (db, tenant) = setup().await;
        let result = db.products().create(&tenant, &new_product("Free", 0)).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (db, tenant) = setup().await;
        let repo = db.products();
        let created = repo.create(&tenant, &new_product("Widget", 1_000)).await.unwrap();

        let updated = repo
            .update(
                &tenant,
                &created.id,
                &ProductPatch {
                    unit_price_cents: Some(1_250),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.unit_price_cents, 1_250);

        let err = repo
            .update("other-tenant", &created.id, &ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
