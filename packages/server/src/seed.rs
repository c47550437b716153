use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{rice, rice_preview, rice_star, user_ban};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup. Failures are logged and
/// tolerated; the queries still run, just slower.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // The recent feed's keyset predicate and ordering:
    // WHERE (created_at, id) < (?, ?) ORDER BY created_at DESC, id DESC
    let feed_recent = Index::create()
        .if_not_exists()
        .name("idx_rices_created_id")
        .table(rice::Entity)
        .col(rice::Column::CreatedAt)
        .col(rice::Column::Id)
        .to_owned();

    // Star counting groups by rice.
    let stars_by_rice = Index::create()
        .if_not_exists()
        .name("idx_rice_stars_rice")
        .table(rice_star::Entity)
        .col(rice_star::Column::RiceId)
        .to_owned();

    // The thumbnail lookup takes the earliest preview per rice.
    let previews_by_rice = Index::create()
        .if_not_exists()
        .name("idx_rice_previews_rice_created")
        .table(rice_preview::Entity)
        .col(rice_preview::Column::RiceId)
        .col(rice_preview::Column::CreatedAt)
        .to_owned();

    // Active-ban lookups run on every authenticated write.
    let bans_by_user = Index::create()
        .if_not_exists()
        .name("idx_user_bans_user_revoked")
        .table(user_ban::Entity)
        .col(user_ban::Column::UserId)
        .col(user_ban::Column::IsRevoked)
        .to_owned();

    for (name, index) in [
        ("idx_rices_created_id", feed_recent),
        ("idx_rice_stars_rice", stars_by_rice),
        ("idx_rice_previews_rice_created", previews_by_rice),
        ("idx_user_bans_user_revoked", bans_by_user),
    ] {
        ensure_index(db, name, &index).await;
    }

    Ok(())
}

async fn ensure_index(db: &DatabaseConnection, name: &str, index: &IndexCreateStatement) {
    let stmt = index.to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}
