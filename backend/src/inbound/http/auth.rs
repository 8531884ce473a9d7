//! Request identity and authorization guards.
//!
//! [`CurrentUser`] is extracted from the session on every request. The guards
//! escalate in order: signed in, then activated, then holding a permission.
//! Permission sets are read from storage on each check and never cached.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::domain::{AccountService, CurrentUser, Error, User};

use super::HttpResult;
use super::session::SessionContext;
use super::state::HttpState;

/// Resolve the session's user id into a [`CurrentUser`].
///
/// A missing or undecodable id is anonymous. So is an id with no matching
/// account, or one whose session epoch predates the user's last logout; in
/// both cases the stale identity is removed from the session.
pub async fn resolve_current_user(
    session: &SessionContext,
    accounts: &AccountService,
) -> HttpResult<CurrentUser> {
    let Some(user_id) = session.user_id() else {
        return Ok(CurrentUser::Anonymous);
    };
    match accounts.find_user(user_id).await? {
        Some(user) if session.session_epoch() == Some(user.session_epoch) => {
            Ok(CurrentUser::Authenticated(user))
        }
        Some(user) => {
            debug!(
                user_id,
                current_epoch = user.session_epoch,
                "session ended by an earlier logout; clearing it"
            );
            session.forget_user();
            Ok(CurrentUser::Anonymous)
        }
        None => {
            warn!(user_id, "session refers to a missing user; clearing it");
            session.forget_user();
            Ok(CurrentUser::Anonymous)
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let session = session.await.map_err(Error::from)?;
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            resolve_current_user(&session, &state.accounts).await
        })
    }
}

/// The signed-in user, or 401.
pub fn require_authenticated(current: &CurrentUser) -> HttpResult<&User> {
    current
        .user()
        .ok_or_else(|| Error::unauthorized("you must be logged in to access this resource"))
}

/// A signed-in, activated user; 401 when anonymous and 403 when inactive.
pub fn require_activated(current: &CurrentUser) -> HttpResult<&User> {
    let user = require_authenticated(current)?;
    if user.activated {
        Ok(user)
    } else {
        Err(Error::forbidden("your account must be activated to access this resource"))
    }
}

/// An activated user whose current permissions include `code`.
pub async fn require_permission<'a>(
    accounts: &AccountService,
    current: &'a CurrentUser,
    code: &str,
) -> HttpResult<&'a User> {
    let user = require_activated(current)?;
    let permissions = accounts.permissions(user.id).await?;
    if permissions.contains(code) {
        Ok(user)
    } else {
        debug!(user_id = user.id, code, "permission denied");
        Err(Error::forbidden(
            "your account doesn't have the necessary permissions to access this resource",
        ))
    }
}

/// Whether `current` could pass [`require_permission`], for showing controls.
///
/// Anonymous and inactive callers short-circuit without a storage read.
pub async fn has_permission(
    accounts: &AccountService,
    current: &CurrentUser,
    code: &str,
) -> HttpResult<bool> {
    match current.user() {
        Some(user) if user.activated => Ok(accounts.permissions(user.id).await?.contains(code)),
        _ => Ok(false),
    }
}
