//! Test helpers for the messages crate.
//!
//! Provides a `FailingRepository` whose every call fails with an internal
//! storage error, and a `TestDb` fixture: a PostgreSQL schema created for
//! one test run and dropped again by [`TestDb::teardown`].

use async_trait::async_trait;
use deadpool_postgres::Pool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, PgMessageRepository};
use crate::error::AppError;
use crate::repository::{MessageRepository, StorageQuery};
use crate::types::{CreateMessage, Message, MessageId, MessageRow, MessageVersion, ModifyMessage};

/// Cause attached by [`FailingRepository`].
#[derive(Debug, Error)]
#[error("storage unavailable")]
pub struct StorageUnavailable;

/// Repository that fails every call, for exercising error paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRepository;

fn unavailable(op: &'static str) -> AppError {
    AppError::internal(op).with_source(StorageUnavailable)
}

#[async_trait]
impl MessageRepository for FailingRepository {
    async fn create(&self, _message: &CreateMessage) -> Result<MessageId, AppError> {
        Err(unavailable("FailingRepository.Create"))
    }

    async fn get_by_id(&self, _id: MessageId) -> Result<Message, AppError> {
        Err(unavailable("FailingRepository.GetById"))
    }

    async fn update_by_id(
        &self,
        _id: MessageId,
        _message: &ModifyMessage,
    ) -> Result<MessageVersion, AppError> {
        Err(unavailable("FailingRepository.UpdateById"))
    }

    async fn delete_by_id(&self, _id: MessageId) -> Result<(), AppError> {
        Err(unavailable("FailingRepository.DeleteById"))
    }

    async fn get_all_query(&self, _query: &StorageQuery) -> Result<Vec<MessageRow>, AppError> {
        Err(unavailable("FailingRepository.GetAllQuery"))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(unavailable("FailingRepository.Ping"))
    }
}

/// A migrated PostgreSQL schema private to one test.
///
/// Pass the fixture (or its pool) explicitly to the code under test and
/// call [`TestDb::teardown`] when done.
pub struct TestDb {
    pub pool: Pool,
    admin: Pool,
    schema: String,
    #[cfg(feature = "testcontainers")]
    _container: Option<testcontainers::ContainerAsync<testcontainers_modules::postgres::Postgres>>,
}

impl TestDb {
    /// Create a fixture against the server in `DATABASE_URL`.
    pub async fn from_env() -> Result<Self, String> {
        let url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL not set".to_string())?;
        Self::with_url(&url).await
    }

    /// Create a fresh schema on the given server and apply migrations to it.
    pub async fn with_url(database_url: &str) -> Result<Self, String> {
        let admin = db::create_pool(database_url)?;
        let schema = format!("test_{}", Uuid::new_v4().simple());

        admin
            .get()
            .await
            .map_err(|e| format!("pool error: {}", e))?
            .batch_execute(&format!("CREATE SCHEMA {}", schema))
            .await
            .map_err(|e| format!("create schema: {}", e))?;

        let pool = db::create_pool_with_search_path(database_url, Some(&schema))?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            admin,
            schema,
            #[cfg(feature = "testcontainers")]
            _container: None,
        })
    }

    /// Start a throwaway postgres container and create a fixture in it.
    #[cfg(feature = "testcontainers")]
    pub async fn start_container() -> Result<Self, String> {
        use testcontainers::runners::AsyncRunner;

        let container = testcontainers_modules::postgres::Postgres::default()
            .start()
            .await
            .map_err(|e| format!("start postgres container: {}", e))?;
        let host = container
            .get_host()
            .await
            .map_err(|e| format!("container host: {}", e))?;
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .map_err(|e| format!("container port: {}", e))?;

        let url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        let mut db = Self::with_url(&url).await?;
        db._container = Some(container);
        Ok(db)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn repository(&self) -> PgMessageRepository {
        PgMessageRepository::new(self.pool.clone())
    }

    /// Close the fixture's connections and drop its schema.
    pub async fn teardown(self) -> Result<(), String> {
        self.pool.close();

        self.admin
            .get()
            .await
            .map_err(|e| format!("pool error: {}", e))?
            .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .await
            .map_err(|e| format!("drop schema: {}", e))?;

        self.admin.close();
        Ok(())
    }
}
