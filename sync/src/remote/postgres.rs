//! PostgreSQL-backed remote document store.

use super::{RemoteStore, PROBE_DATASET, PROBE_USER};
use crate::config::Config;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tandem_engine::{DatasetName, RemoteDocument};

/// Remote store keeping one row per (user, dataset) in the `documents` table.
#[derive(Debug, Clone)]
pub struct PgRemoteStore {
    pool: PgPool,
}

impl PgRemoteStore {
    /// Build a store whose pool connects on first use.
    ///
    /// Connecting lazily lets the process start while the database is
    /// unreachable; the first probe then reports the outage.
    pub fn connect_lazy(config: &Config) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy(&config.database_url)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// Connection failures come back recoverable so an offline start can
    /// proceed; anything else means the schema cannot be trusted.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| match e {
                MigrateError::Execute(err) => map_sqlx_error(err),
                other => StoreError::Remote(other.to_string()),
            })
    }
}

/// Row shape of the `documents` table.
type DocumentRow = (serde_json::Value, String, String, String, String);

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn get_document(
        &self,
        user: &str,
        dataset: DatasetName,
    ) -> Result<Option<RemoteDocument>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT data, updated_at, data_type, version, source
            FROM documents
            WHERE user_id = $1 AND dataset = $2
            "#,
        )
        .bind(user)
        .bind(dataset.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some((data, updated_at, data_type, version, source)) => Ok(Some(RemoteDocument {
                data,
                updated_at,
                data_type: data_type.parse::<DatasetName>()?,
                version,
                source,
            })),
            None => Ok(None),
        }
    }

    async fn put_document(
        &self,
        user: &str,
        dataset: DatasetName,
        document: &RemoteDocument,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (user_id, dataset, data, updated_at, data_type, version, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, dataset) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at,
                data_type = EXCLUDED.data_type,
                version = EXCLUDED.version,
                source = EXCLUDED.source
            "#,
        )
        .bind(user)
        .bind(dataset.as_str())
        .bind(&document.data)
        .bind(&document.updated_at)
        .bind(document.data_type.as_str())
        .bind(&document.version)
        .bind(&document.source)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_document(&self, user: &str, dataset: DatasetName) -> Result<()> {
        sqlx::query(r#"DELETE FROM documents WHERE user_id = $1 AND dataset = $2"#)
            .bind(user)
            .bind(dataset.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        let _: (bool,) = sqlx::query_as(
            r#"SELECT EXISTS(SELECT 1 FROM documents WHERE user_id = $1 AND dataset = $2)"#,
        )
        .bind(PROBE_USER)
        .bind(PROBE_DATASET)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// Map a driver error onto the store error taxonomy.
///
/// Only transport failures and connection-class SQLSTATEs count as the remote
/// being unavailable. Everything else is a broken call and must not be
/// hidden behind a local fallback.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => map_sqlstate(db_err.code().as_deref(), db_err.message()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Remote(err.to_string()),
    }
}

fn map_sqlstate(code: Option<&str>, message: &str) -> StoreError {
    let message = message.to_string();
    match code {
        // insufficient_privilege
        Some("42501") => StoreError::PermissionDenied(message),
        // invalid_authorization_specification, invalid_password
        Some("28000") | Some("28P01") => StoreError::Unauthenticated(message),
        // connection_exception, operator_intervention (shutdown, cannot connect now)
        Some(code) if code.starts_with("08") || code.starts_with("57P") => {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Remote(message),
    }
}
