pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmReservationRepository;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrator::Migrator;

/// Initialize database connection
pub async fn init_database(url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", url);
    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Apply pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    info!("Running database migrations...");
    Migrator::up(db, None).await?;
    info!("Migrations completed");
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}
