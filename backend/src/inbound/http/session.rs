//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie carries the authenticated user's id and the session epoch the
//! user had at login. Cookies are stored client side, so renewing one cannot
//! revoke a copy taken earlier; logout instead advances the user's epoch in
//! storage and [`crate::inbound::http::auth::resolve_current_user`] rejects
//! any cookie whose epoch is out of date.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::Error;

pub(crate) const USER_ID_KEY: &str = "authenticated_user_id";
pub(crate) const SESSION_EPOCH_KEY: &str = "session_epoch";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Rotate the session and record `user_id` as signed in at `session_epoch`.
    pub fn login(&self, user_id: i64, session_epoch: i32) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id)
            .and_then(|()| self.0.insert(SESSION_EPOCH_KEY, session_epoch))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Rotate the session and drop the signed-in user.
    pub fn logout(&self) {
        self.0.renew();
        self.forget_user();
    }

    /// Remove a user id that no longer resolves to a valid sign-in.
    pub fn forget_user(&self) {
        self.0.remove(USER_ID_KEY);
        self.0.remove(SESSION_EPOCH_KEY);
    }

    /// The signed-in user id, if the cookie carries a decodable one.
    pub fn user_id(&self) -> Option<i64> {
        match self.0.get::<i64>(USER_ID_KEY) {
            Ok(id) => id,
            Err(error) => {
                warn!(error = %error, "undecodable user id in session cookie");
                None
            }
        }
    }

    /// The epoch recorded at login; cookies issued without one yield `None`.
    pub fn session_epoch(&self) -> Option<i32> {
        self.0.get::<i32>(SESSION_EPOCH_KEY).ok().flatten()
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
