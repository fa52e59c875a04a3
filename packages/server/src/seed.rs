use sea_orm::*;
use tracing::info;

use crate::entity::allowed_member;

/// Seed the sign-up allow list with the configured bootstrap email.
///
/// A fresh deployment has an empty allow list and registration refuses
/// everyone; the bootstrap entry carries the `super` role so the first member
/// in can manage the rest.
pub async fn seed_bootstrap_email(
    db: &DatabaseConnection,
    bootstrap_email: Option<&str>,
) -> Result<(), DbErr> {
    let Some(email) = bootstrap_email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let model = allowed_member::ActiveModel {
        email: Set(email.to_lowercase()),
        role: Set(Some("super".to_string())),
        joined_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = allowed_member::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(allowed_member::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {
            info!(email, "Seeded bootstrap allow-list entry");
            Ok(())
        }
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}
