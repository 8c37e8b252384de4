use crate::orm::groups;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, Set};

pub async fn get_group_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find()
        .filter(groups::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// All groups, for the post form's group select.
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .all(db)
        .await
}

/// Groups have no web form; they are created by operators through this call.
pub async fn create_group(
    db: &DatabaseConnection,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<groups::Model, DbErr> {
    let group = groups::ActiveModel {
        title: Set(title.to_owned()),
        slug: Set(slug.to_owned()),
        description: Set(description.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("create_group: {} ({})", group.title, group.slug);
    Ok(group)
}
