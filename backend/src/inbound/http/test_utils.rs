//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use chrono::Utc;

use crate::domain::ports::{BeanRepository, RoasterRepository, UserRepository};
use crate::domain::{
    AccountService, Bean, BeanDraft, BeanService, NewUser, PermissionCode, RoastLevel, Roaster,
    RoasterDraft, RoasterService, User,
};
use crate::outbound::memory::{MemoryAccounts, MemoryCatalogue};

use super::HttpResult;
use super::session::SessionContext;
use super::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by `response`, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// In-memory stores plus the state wired over them.
pub struct MemoryHarness {
    pub catalogue: MemoryCatalogue,
    pub accounts: MemoryAccounts,
    pub state: HttpState,
}

/// State backed by fresh in-memory stores.
pub fn memory_harness() -> MemoryHarness {
    let catalogue = MemoryCatalogue::default();
    let accounts = MemoryAccounts::default();
    let roasters = Arc::new(catalogue.clone());
    let beans = Arc::new(catalogue.clone());
    let users = Arc::new(accounts.clone());
    let permissions = Arc::new(accounts.clone());
    let state = HttpState::new(
        RoasterService::new(roasters.clone(), beans.clone()),
        BeanService::new(beans, roasters),
        AccountService::new(users, permissions),
    );
    MemoryHarness {
        catalogue,
        accounts,
        state,
    }
}

/// A stored user fixture; the hash is never checked by guard tests.
pub fn user_fixture(id: i64, activated: bool) -> User {
    User::new(
        id,
        "Ada",
        "ada@example.com",
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
        activated,
        Utc::now(),
        1,
    )
}

/// Store a user with `codes` granted.
pub async fn seed_user(accounts: &MemoryAccounts, email: &str, activated: bool, codes: &[&str]) -> User {
    let codes: Vec<PermissionCode> = codes
        .iter()
        .map(|code| PermissionCode::new(*code).expect("valid permission code"))
        .collect();
    let new_user = NewUser {
        name: "Ada".to_owned(),
        email: email.to_owned(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
        activated,
    };
    UserRepository::insert_with_permissions(accounts, &new_user, &codes)
        .await
        .expect("seed user")
}

pub async fn seed_roaster(catalogue: &MemoryCatalogue, name: &str, location: &str) -> Roaster {
    let draft = RoasterDraft {
        name: name.to_owned(),
        description: format!("{name} roasts in small batches"),
        website: "https://roaster.example".to_owned(),
        location: location.to_owned(),
    };
    RoasterRepository::insert(catalogue, &draft)
        .await
        .expect("seed roaster")
}

pub async fn seed_bean(
    catalogue: &MemoryCatalogue,
    roaster_id: i64,
    name: &str,
    roast_level: RoastLevel,
) -> Bean {
    let draft = BeanDraft {
        name: name.to_owned(),
        roast_level,
        roaster_id,
    };
    BeanRepository::insert(catalogue, &draft)
        .await
        .expect("seed bean")
}

/// Test-only route that signs the session in as `{id}`.
pub const TEST_LOGIN_PATH: &str = "/__test/login";

/// Signs in at epoch 0, the epoch of an account that never logged out.
async fn login_as(session: SessionContext, id: web::Path<i64>) -> HttpResult<HttpResponse> {
    session.login(id.into_inner(), 0)?;
    Ok(HttpResponse::Ok().finish())
}

/// The full route table over `state`, plus the test login route.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .route(&format!("{TEST_LOGIN_PATH}/{{id}}"), web::get().to(login_as))
        .configure(super::configure)
}

/// Session cookie for a client signed in as `user_id`.
pub async fn login_cookie<S>(app: &S, user_id: i64) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri(&format!("{TEST_LOGIN_PATH}/{user_id}"))
            .to_request(),
    )
    .await;
    session_cookie(&res).expect("login sets a session cookie")
}
