use crate::orm::{posts, users};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, PaginatorTrait, Set, SqlErr,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] argon2::password_hash::Error),
    #[error("username is already taken")]
    UsernameTaken,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub name: String,
}

/// Author information shown on profile pages and next to posts.
#[derive(Clone, Debug, FromQueryResult)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: NaiveDateTime,
}

impl UserProfile {
    /// Returns "first last" when either is set, otherwise the username.
    pub fn get_full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.to_owned()
        } else {
            full.to_owned()
        }
    }
}

/// Validated sign-up data.
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is malformed: {}", e);
            false
        }
    }
}

pub async fn create_user(db: &DatabaseConnection, new: NewUser<'_>) -> Result<users::Model, UserError> {
    let password = hash_password(new.password)?;
    let user = users::ActiveModel {
        username: Set(new.username.to_owned()),
        email: Set(new.email.map(|e| e.to_owned())),
        first_name: Set(new.first_name.to_owned()),
        last_name: Set(new.last_name.to_owned()),
        password: Set(password),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::UsernameTaken,
        _ => UserError::Db(e),
    })?;

    log::info!("create_user: registered {} (#{})", user.username, user.id);
    Ok(user)
}

/// Checks credentials and returns the client on success.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<ClientUser>, DbErr> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;

    Ok(match user {
        Some(user) if verify_password(password, &user.password) => Some(ClientUser {
            id: user.id,
            name: user.username,
        }),
        _ => None,
    })
}

pub async fn get_client_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column_as(users::Column::Username, "name")
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn get_profile_by_name(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<UserProfile>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .into_model::<UserProfile>()
        .one(db)
        .await
}

pub async fn username_exists(db: &DatabaseConnection, username: &str) -> Result<bool, DbErr> {
    Ok(users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .count(db)
        .await?
        > 0)
}

pub async fn count_posts(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    posts::Entity::find()
        .filter(posts::Column::AuthorId.eq(user_id))
        .count(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: &str, last: &str) -> UserProfile {
        UserProfile {
            id: 1,
            username: "leo".to_owned(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(profile("Leo", "Tolstoy").get_full_name(), "Leo Tolstoy");
        assert_eq!(profile("Leo", "").get_full_name(), "Leo");
        assert_eq!(profile("", "").get_full_name(), "leo");
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("Test1234").expect("hash");
        assert!(verify_password("Test1234", &hash));
        assert!(!verify_password("test1234", &hash));
        assert!(!verify_password("Test1234", "not a hash"));
    }
}
