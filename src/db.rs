use migration::Migrator;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    apply_pragmas(&db).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

async fn apply_pragmas(db: &DatabaseConnection) -> AppResult<()> {
    for pragma in
        ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA foreign_keys=ON"]
    {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }
    Ok(())
}

#[cfg(test)]
pub async fn connect_for_tests() -> DatabaseConnection {
    // More than one pooled connection would hand each statement its own
    // empty in-memory database.
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.expect("in-memory sqlite");
    apply_pragmas(&db).await.expect("pragmas");
    Migrator::up(&db, None).await.expect("migrations");
    db
}
