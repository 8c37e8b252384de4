use crate::orm::follows;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, PaginatorTrait, Set};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is forbidden; nothing was stored.
    SelfFollow,
}

pub async fn is_following(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn follow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<FollowOutcome, DbErr> {
    if user_id == author_id {
        log::debug!("follow_author: user #{} tried to follow themself", user_id);
        return Ok(FollowOutcome::SelfFollow);
    }

    let inserted = follows::Entity::insert(follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        created_at: Set(Utc::now().naive_utc()),
    })
    .on_conflict(
        OnConflict::columns([follows::Column::UserId, follows::Column::AuthorId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok(if inserted > 0 {
        FollowOutcome::Created
    } else {
        FollowOutcome::AlreadyFollowing
    })
}

/// Returns whether an edge was removed.
pub async fn unfollow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    let res = follows::Entity::delete_many()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn count_followers(db: &DatabaseConnection, author_id: i32) -> Result<u64, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}
