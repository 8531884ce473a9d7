//! Account pages.
//!
//! ```text
//! GET  /user/signup   signup form
//! POST /user/signup   register, then go to the login page
//! GET  /user/login    login form
//! POST /user/login    authenticate, rotate the session, then go home
//! POST /user/logout   rotate the session and forget the user
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{info, warn};

use crate::domain::{CurrentUser, FormError, LoginError, LoginForm, SignupForm, Validator};

use super::HttpResult;
use super::auth::require_authenticated;
use super::htmx::{private, redirect, render};
use super::session::SessionContext;
use super::state::HttpState;
use super::views;

fn signup_page(
    req: &HttpRequest,
    status: StatusCode,
    current: &CurrentUser,
    form: &SignupForm,
    errors: &Validator,
) -> HttpResponse {
    private(render(
        req,
        status,
        "Sign up",
        current,
        views::users::signup_form(&form.name, &form.email, errors),
        |fragment| views::titled("Sign up", fragment),
    ))
}

fn login_page(
    req: &HttpRequest,
    status: StatusCode,
    current: &CurrentUser,
    email: &str,
    errors: &Validator,
) -> HttpResponse {
    private(render(
        req,
        status,
        "Log in",
        current,
        views::users::login_form(email, errors),
        |fragment| views::titled("Log in", fragment),
    ))
}

#[get("/user/signup")]
pub async fn signup_form(req: HttpRequest, current: CurrentUser) -> HttpResponse {
    signup_page(
        &req,
        StatusCode::OK,
        &current,
        &SignupForm::default(),
        &Validator::new(),
    )
}

#[post("/user/signup")]
pub async fn signup(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    form: web::Form<SignupForm>,
) -> HttpResult<HttpResponse> {
    match state.accounts.signup(&form).await {
        Ok(_) => Ok(redirect(&req, "/user/login")),
        Err(FormError::Invalid(errors)) => Ok(signup_page(
            &req,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            &form,
            &errors,
        )),
        Err(FormError::Failed(err)) => Err(err),
    }
}

#[get("/user/login")]
pub async fn login_form(req: HttpRequest, current: CurrentUser) -> HttpResponse {
    login_page(&req, StatusCode::OK, &current, "", &Validator::new())
}

/// Sign in. Unknown e-mail and wrong password look identical to the caller.
#[post("/user/login")]
pub async fn login(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    current: CurrentUser,
    form: web::Form<LoginForm>,
) -> HttpResult<HttpResponse> {
    match state.accounts.authenticate(&form).await {
        Ok(user) => {
            session.login(user.id, user.session_epoch)?;
            info!(user_id = user.id, "user logged in");
            Ok(redirect(&req, "/"))
        }
        Err(LoginError::Failed(err)) => Err(err),
        Err(err) => {
            warn!(reason = err.reason(), "login rejected");
            match err.into_form_error() {
                FormError::Invalid(errors) => Ok(login_page(
                    &req,
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &current,
                    &form.email,
                    &errors,
                )),
                FormError::Failed(err) => Err(err),
            }
        }
    }
}

/// Sign out everywhere: every cookie issued to the user stops authenticating.
#[post("/user/logout")]
pub async fn logout(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    current: CurrentUser,
) -> HttpResult<HttpResponse> {
    let user = require_authenticated(&current)?;
    state.accounts.end_sessions(user.id).await?;
    session.logout();
    info!(user_id = user.id, "user logged out");
    Ok(redirect(&req, "/"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup_form)
        .service(signup)
        .service(login_form)
        .service(login)
        .service(logout);
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
