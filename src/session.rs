use crate::user::{get_client_by_id, ClientUser};
use actix_session::Session;
use sea_orm::DatabaseConnection;

/// Key under which the authenticated user id is stored in the cookie session.
const SESSION_USER_KEY: &str = "user_id";

/// Resolves the client user from the cookie session, if any.
/// Sessions pointing at users that no longer exist are purged.
pub async fn authenticate_client_by_session(
    session: &Session,
    db: &DatabaseConnection,
) -> Option<ClientUser> {
    let user_id = match session.get::<i32>(SESSION_USER_KEY) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_client_by_session: session.get(): {}", e);
            return None;
        }
    };

    match get_client_by_id(db, user_id).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            log::warn!(
                "authenticate_client_by_session: user #{} no longer exists",
                user_id
            );
            session.purge();
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

/// Binds the session to a user. The session id is rotated to prevent fixation.
pub fn login(session: &Session, user: &ClientUser) -> Result<(), actix_web::Error> {
    session.renew();
    session
        .insert(SESSION_USER_KEY, user.id)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    log::info!("login: {} (#{})", user.name, user.id);
    Ok(())
}

pub fn logout(session: &Session) {
    session.purge();
}
