use crate::orm::{comments, follows, groups, posts, users};
use crate::paginator::{fetch_page, Page};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, Select, Set,
    TransactionTrait,
};

/// Number of words shown for a post in listings.
const EXCERPT_WORDS: usize = 30;

/// A fully joined struct representing the post model and its relational data.
#[derive(Debug, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub author_id: i32,
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    // join users
    pub username: String,
    // join groups
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl PostForTemplate {
    /// Leading words of the text, with an ellipsis when truncated.
    pub fn excerpt(&self) -> String {
        let mut words = self.text.split_whitespace();
        let head: Vec<&str> = words.by_ref().take(EXCERPT_WORDS).collect();
        if words.next().is_some() {
            format!("{} …", head.join(" "))
        } else {
            self.text.to_owned()
        }
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{}", path))
    }
}

pub struct NewPost {
    pub author_id: i32,
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// Posts joined with their author name and group, newest first.
fn select_posts() -> Select<posts::Entity> {
    posts::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
}

/// Returns the result of a query selecting for a post by id with adjoined templating data.
pub async fn get_post_for_template(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    select_posts()
        .filter(posts::Column::Id.eq(id))
        .into_model::<PostForTemplate>()
        .one(db)
        .await
}

pub async fn get_index_page(
    db: &DatabaseConnection,
    page: u64,
) -> Result<Page<PostForTemplate>, DbErr> {
    fetch_page(db, select_posts().into_model(), "/", page).await
}

pub async fn get_group_page(
    db: &DatabaseConnection,
    group: &groups::Model,
    page: u64,
) -> Result<Page<PostForTemplate>, DbErr> {
    fetch_page(
        db,
        select_posts()
            .filter(posts::Column::GroupId.eq(group.id))
            .into_model(),
        &format!("/group/{}/", group.slug),
        page,
    )
    .await
}

pub async fn get_author_page(
    db: &DatabaseConnection,
    author_id: i32,
    username: &str,
    page: u64,
) -> Result<Page<PostForTemplate>, DbErr> {
    fetch_page(
        db,
        select_posts()
            .filter(posts::Column::AuthorId.eq(author_id))
            .into_model(),
        &format!("/profile/{}/", username),
        page,
    )
    .await
}

/// Posts by every author `user_id` follows.
pub async fn get_feed_page(
    db: &DatabaseConnection,
    user_id: i32,
    page: u64,
) -> Result<Page<PostForTemplate>, DbErr> {
    let followed = Query::select()
        .column(follows::Column::AuthorId)
        .from(follows::Entity)
        .and_where(follows::Column::UserId.eq(user_id))
        .to_owned();

    fetch_page(
        db,
        select_posts()
            .filter(posts::Column::AuthorId.in_subquery(followed))
            .into_model(),
        "/follow/",
        page,
    )
    .await
}

pub async fn create_post(db: &DatabaseConnection, post: NewPost) -> Result<posts::Model, DbErr> {
    let post = posts::ActiveModel {
        author_id: Set(post.author_id),
        text: Set(post.text.trim().to_owned()),
        group_id: Set(post.group_id),
        image: Set(post.image),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("create_post: #{} by user #{}", post.id, post.author_id);
    Ok(post)
}

/// Replaces text and group. A None image keeps the stored one.
pub async fn update_post(
    db: &DatabaseConnection,
    id: i32,
    text: &str,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<(), DbErr> {
    let mut post = posts::ActiveModel {
        id: Set(id),
        text: Set(text.trim().to_owned()),
        group_id: Set(group_id),
        ..Default::default()
    };
    if image.is_some() {
        post.image = Set(image);
    }
    let post = post.update(db).await?;

    log::info!("update_post: #{} by user #{}", post.id, post.author_id);
    Ok(())
}

/// Deletes the post and its comments in one transaction.
pub async fn delete_post(db: &DatabaseConnection, id: i32) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    comments::Entity::delete_many()
        .filter(comments::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    posts::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    log::info!("delete_post: #{}", id);
    Ok(())
}
