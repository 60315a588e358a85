// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use anyhow::{anyhow, Result};
use deadpool::Runtime;
use diesel::{Connection, PgConnection};
use diesel_async::{
    pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

pub type DbPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type DbConnection = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database manager for the API server
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database manager with connection pool
    pub async fn new() -> Result<Self> {
        let config = Config::get();
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database.url);

        // Configure pool with connection parameters
        let pool = DbPool::builder(manager)
            .max_size(config.database.max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()?;

        // Create database instance
        let db = Self { pool };

        // Test connection and run migrations
        db.initialize().await?;

        Ok(db)
    }

    /// Initialize the database by testing connection and running migrations
    async fn initialize(&self) -> Result<()> {
        // Test connection by getting a connection from the pool
        let _conn = self.get_connection().await?;
        info!("Successfully connected to the database");

        // Run migrations
        self.run_migrations()?;

        Ok(())
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let config = Config::get();
        let mut conn = PgConnection::establish(&config.database.url)?;

        // Apply migrations
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
        info!("Database migrations applied successfully");

        Ok(())
    }

    /// Get a database connection from the pool
    pub async fn get_connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow!("Failed to get database connection: {}", e))
    }

    /// Get the database connection pool reference
    pub fn get_pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Initialize database connection pool and run migrations
pub async fn init_database() -> Result<Database> {
    Database::new().await
}
