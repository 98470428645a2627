//! Database layer using SeaORM over SQLite.

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;

/// Wrapper around the library database connection.
pub struct Database {
    conn: DatabaseConnection,
}

impl Database {
    /// Open the database at `path`, creating it if needed.
    pub async fn open(path: &Path) -> Result<Self, DbErr> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbErr::Custom(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt).await?;
        info!("Opened database at {:?}", path);
        Ok(Self { conn })
    }

    /// In-memory database for tests. A single connection, since each SQLite
    /// `:memory:` connection gets its own private database.
    pub async fn open_in_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let conn = SeaDatabase::connect(opt).await?;
        Ok(Self { conn })
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<(), DbErr> {
        migration::Migrator::up(&self.conn, None).await?;
        info!("Database migrations completed");
        Ok(())
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}
