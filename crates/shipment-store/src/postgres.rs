use async_trait::async_trait;
use common::{OrderKey, ShipmentId, Version};
use domain::Shipment;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Page, Result, ShipmentQuery, StoreError, store::ShipmentStore};

const ORDER_KEY_CONSTRAINT: &str = "unique_shipment_order_key";
const PRIMARY_KEY_CONSTRAINT: &str = "shipments_pkey";

/// PostgreSQL-backed shipment store.
///
/// Each shipment is one row holding the full aggregate as JSONB, next to
/// the columns used for uniqueness, filtering and ordering.
#[derive(Clone)]
pub struct PostgresShipmentStore {
    pool: PgPool,
}

impl PostgresShipmentStore {
    /// Creates a new PostgreSQL shipment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect(url).await?))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_shipment(row: PgRow) -> Result<Shipment> {
        let state: serde_json::Value = row.try_get("state")?;
        let mut shipment: Shipment = serde_json::from_value(state)?;
        shipment.set_version(Version::new(row.try_get("version")?));
        Ok(shipment)
    }

    async fn current_version(&self, id: ShipmentId) -> Result<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM shipments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(version.map(Version::new))
    }

    async fn insert(&self, shipment: &Shipment, state: serde_json::Value) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO shipments (id, order_key, status, version, state, is_deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(shipment.id().as_uuid())
        .bind(shipment.order_key().as_str())
        .bind(shipment.status().as_str())
        .bind(shipment.version().as_i64())
        .bind(state)
        .bind(shipment.is_deleted())
        .bind(shipment.audit().created_at)
        .bind(shipment.audit().updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if violates(&e, ORDER_KEY_CONSTRAINT) => {
                Err(StoreError::DuplicateOrderKey(shipment.order_key().clone()))
            }
            Err(e) if violates(&e, PRIMARY_KEY_CONSTRAINT) => {
                let actual = self
                    .current_version(shipment.id())
                    .await?
                    .unwrap_or_default();
                Err(StoreError::ConcurrencyConflict {
                    shipment_id: shipment.id(),
                    expected: Version::initial(),
                    actual,
                })
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn update(
        &self,
        shipment: &Shipment,
        expected: Version,
        state: serde_json::Value,
    ) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE shipments
            SET status = $1, version = $2, state = $3, is_deleted = $4, updated_at = $5
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(shipment.status().as_str())
        .bind(shipment.version().as_i64())
        .bind(state)
        .bind(shipment.is_deleted())
        .bind(shipment.audit().updated_at)
        .bind(shipment.id().as_uuid())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(());
        }

        match self.current_version(shipment.id()).await? {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                shipment_id: shipment.id(),
                expected,
                actual,
            }),
            None => Err(StoreError::NotFound(shipment.id())),
        }
    }
}

fn violates(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

#[async_trait]
impl ShipmentStore for PostgresShipmentStore {
    async fn save(&self, mut shipment: Shipment) -> Result<Shipment> {
        let expected = shipment.version();
        shipment.set_version(expected.next());
        let state = serde_json::to_value(&shipment)?;

        if expected.is_initial() {
            self.insert(&shipment, state).await?;
        } else {
            self.update(&shipment, expected, state).await?;
        }

        tracing::debug!(shipment_id = %shipment.id(), version = %shipment.version(), "shipment saved");
        Ok(shipment)
    }

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>> {
        sqlx::query("SELECT state, version FROM shipments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_shipment)
            .transpose()
    }

    async fn find_by_order_key(&self, order_key: &OrderKey) -> Result<Option<Shipment>> {
        sqlx::query("SELECT state, version FROM shipments WHERE order_key = $1")
            .bind(order_key.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_shipment)
            .transpose()
    }

    async fn exists_by_order_key(&self, order_key: &OrderKey) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shipments WHERE order_key = $1)")
                .bind(order_key.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn list(&self, query: ShipmentQuery) -> Result<Page<Shipment>> {
        let status = query.status.map(|s| s.as_str());
        let limit = query.effective_limit();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM shipments
            WHERE ($1::TEXT IS NULL OR status = $1) AND ($2 OR NOT is_deleted)
            "#,
        )
        .bind(status)
        .bind(query.include_deleted)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT state, version FROM shipments
            WHERE ($1::TEXT IS NULL OR status = $1) AND ($2 OR NOT is_deleted)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(query.include_deleted)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Self::row_to_shipment)
                .collect::<Result<Vec<_>>>()?,
            total: total as usize,
            offset: query.offset,
            limit,
        })
    }
}
