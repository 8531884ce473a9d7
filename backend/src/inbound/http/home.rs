//! Landing page.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get};

use crate::domain::CurrentUser;

use super::htmx::render;
use super::views;

#[get("/")]
pub async fn home(req: HttpRequest, current: CurrentUser) -> HttpResponse {
    render(
        &req,
        StatusCode::OK,
        "Home",
        &current,
        views::home::home(&current),
        |page| page,
    )
}
