//! End-to-end page flows over the PostgreSQL adapters.
//!
//! A visitor signs up, logs in, is refused catalogue writes until an
//! administrator grants `roasters:write`, then creates and edits a roaster.

mod support;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use postgres::{Client, NoTls};
use rstest::rstest;

use roastery::Trace;
use roastery::domain::{AccountService, BeanService, RoasterService, TRACE_ID_HEADER};
use roastery::inbound::http::configure;
use roastery::inbound::http::state::HttpState;
use roastery::outbound::persistence::{
    DbPool, DieselBeanRepository, DieselPermissionRepository, DieselRoasterRepository,
    DieselUserRepository,
};
use support::{format_postgres_error, test_database};

const FORM: &str = "application/x-www-form-urlencoded";

fn diesel_state(pool: &DbPool) -> HttpState {
    let roasters = Arc::new(DieselRoasterRepository::new(pool.clone()));
    let beans = Arc::new(DieselBeanRepository::new(pool.clone()));
    HttpState::new(
        RoasterService::new(roasters.clone(), beans.clone()),
        BeanService::new(beans, roasters),
        AccountService::new(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselPermissionRepository::new(pool.clone())),
        ),
    )
}

/// Grant `code` from a separate thread; the blocking client must not run on
/// the test's async executor.
fn grant(url: &str, email: &str, code: &str) {
    let (url, email, code) = (url.to_owned(), email.to_owned(), code.to_owned());
    std::thread::spawn(move || {
        let mut client = Client::connect(&url, NoTls)
            .unwrap_or_else(|err| panic!("connect: {}", format_postgres_error(&err)));
        let granted = client
            .execute(
                "INSERT INTO users_permissions (user_id, permission_id) \
                 SELECT u.id, p.id FROM users u, permissions p \
                 WHERE u.email = $1 AND p.code = $2",
                &[&email, &code],
            )
            .unwrap_or_else(|err| panic!("grant: {}", format_postgres_error(&err)));
        assert_eq!(granted, 1);
    })
    .join()
    .expect("grant thread");
}

fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

fn location(res: &ServiceResponse) -> Option<&str> {
    res.headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
}

async fn submit<S>(app: &S, method: &str, uri: &str, cookie: Option<&Cookie<'static>>, payload: &str) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut req = match method {
        "PATCH" => test::TestRequest::patch(),
        _ => test::TestRequest::post(),
    }
    .uri(uri)
    .insert_header(("content-type", FORM))
    .set_payload(payload.to_owned());
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    test::call_service(app, req.to_request()).await
}

#[rstest]
#[::core::prelude::v1::test]
fn visitor_becomes_a_roaster_editor() {
    let Some(db) = test_database() else { return };

    actix_rt::System::new().block_on(async {
        let pool = db.pool().await.expect("pool");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(diesel_state(&pool)))
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_name("session".to_owned())
                        .cookie_secure(false)
                        .build(),
                )
                .wrap(Trace)
                .configure(configure),
        )
        .await;

        let signup = submit(
            &app,
            "POST",
            "/user/signup",
            None,
            "name=Ada&email=ada%40example.com&password=correct+horse",
        )
        .await;
        assert_eq!(signup.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&signup), Some("/user/login"));

        let duplicate = submit(
            &app,
            "POST",
            "/user/signup",
            None,
            "name=Ada&email=ada%40example.com&password=another+secret",
        )
        .await;
        assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let login = submit(
            &app,
            "POST",
            "/user/login",
            None,
            "email=ada%40example.com&password=correct+horse",
        )
        .await;
        assert_eq!(login.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&login);

        let roaster = "name=Ember&description=Small+batch&website=https%3A%2F%2Fember.example&location=Leeds";
        let refused = submit(&app, "POST", "/roasters", Some(&cookie), roaster).await;
        assert_eq!(refused.status(), StatusCode::FORBIDDEN);
        assert!(refused.headers().contains_key(TRACE_ID_HEADER));

        grant(&db.url, "ada@example.com", "roasters:write");

        let created = submit(&app, "POST", "/roasters", Some(&cookie), roaster).await;
        assert_eq!(created.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&created), Some("/roasters/1"));

        let listing = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/roasters?term=leeds&sort=-name")
                .to_request(),
        )
        .await;
        assert_eq!(listing.status(), StatusCode::OK);
        let body = test::read_body(listing).await;
        assert!(String::from_utf8_lossy(&body).contains("Ember"));

        let edit = format!("{roaster}&version=1");
        let updated = submit(&app, "PATCH", "/roasters/1", Some(&cookie), &edit).await;
        assert_eq!(updated.status(), StatusCode::SEE_OTHER);

        let stale = submit(&app, "PATCH", "/roasters/1", Some(&cookie), &edit).await;
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        // Bean writes still need their own permission.
        let bean = submit(
            &app,
            "POST",
            "/beans",
            Some(&cookie),
            "name=House&roast_level=medium&roaster_id=1",
        )
        .await;
        assert_eq!(bean.status(), StatusCode::FORBIDDEN);

        let logout = submit(&app, "POST", "/user/logout", Some(&cookie), "").await;
        assert_eq!(logout.status(), StatusCode::SEE_OTHER);
        let replayed = submit(&app, "POST", "/roasters", Some(&cookie), roaster).await;
        assert_eq!(replayed.status(), StatusCode::UNAUTHORIZED);
    });
}
