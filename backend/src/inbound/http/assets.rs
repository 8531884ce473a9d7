//! Static assets compiled into the binary.

use actix_web::http::header::{CACHE_CONTROL, ContentType};
use actix_web::{HttpResponse, get, mime, web};

use crate::domain::Error;

use super::HttpResult;

const APP_CSS: &str = include_str!("../../../assets/app.css");
const APP_JS: &str = include_str!("../../../assets/app.js");

/// Contents and media type of a known asset.
fn lookup(file: &str) -> Option<(&'static str, ContentType)> {
    match file {
        "app.css" => Some((APP_CSS, ContentType(mime::TEXT_CSS_UTF_8))),
        "app.js" => Some((APP_JS, ContentType(mime::APPLICATION_JAVASCRIPT_UTF_8))),
        _ => None,
    }
}

#[get("/static/{file}")]
pub async fn asset(file: web::Path<String>) -> HttpResult<HttpResponse> {
    let (body, content_type) = lookup(&file)
        .ok_or_else(|| Error::not_found("the requested resource could not be found"))?;
    Ok(HttpResponse::Ok()
        .insert_header(content_type)
        .insert_header((CACHE_CONTROL, "public, max-age=3600"))
        .body(body))
}
