use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::role::RoleName;
use crate::entity::{answer, job, role, user};
use crate::resources::user::{assign_roles, role_names};
use crate::utils::hash;

/// Seed the fixed `role` rows. Safe to run on every startup.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for name in RoleName::ALL {
        let now = chrono::Utc::now();
        let model = role::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) => {}
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    Ok(())
}

/// Ensure the configured administrator exists and holds the `admin` role.
/// Does nothing unless both `admin_email` and `admin_password` are set.
pub async fn seed_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let txn = db.begin().await?;
    let admin = match user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await?
    {
        Some(existing) => existing,
        None => {
            let hashed = hash::hash_password(password)
                .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;
            let now = chrono::Utc::now();
            let created = user::ActiveModel {
                email: Set(email.clone()),
                password: Set(hashed),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            info!(email = %email, "Created administrator");
            created
        }
    };

    let mut roles: Vec<RoleName> = role_names(&txn, vec![admin.id])
        .await?
        .remove(&admin.id)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect();
    if !roles.contains(&RoleName::Admin) {
        roles.push(RoleName::Admin);
        assign_roles(&txn, admin.id, &roles).await?;
    }
    txn.commit().await
}

/// Create composite indexes that schema sync does not derive from the entities.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One answer per user and question. Unique, so failing to create it is fatal.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_answer_user_question")
        .table(answer::Entity)
        .col(answer::Column::UserId)
        .col(answer::Column::QuestionId)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_answer_user_question exists");

    // Claim scans: due jobs in a given state.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_job_state_scheduled")
        .table(job::Entity)
        .col(job::Column::State)
        .col(job::Column::ScheduledAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_job_state_scheduled exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_job_state_scheduled: {}", e);
        }
    }

    Ok(())
}
