use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Connect to PostgreSQL and sync the schema from the registered entities.
///
/// There is no separate migration step: schema-sync creates or alters
/// the tables on startup, and [`crate::seed::ensure_indexes`] adds the
/// composite indexes it cannot express.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Pool sizing for a single API instance. Feed queries hold a
    // connection briefly, so a modest pool with a short acquire
    // timeout keeps overload visible instead of queueing forever.
    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(30 * 60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}
