//! HTMX-aware response helpers.
//!
//! HTMX sends `HX-Request: true` on every request it issues. Such requests
//! get bare fragments and follow redirects through the `HX-Redirect` header;
//! ordinary browser requests get full pages and `303 See Other`.

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, HeaderValue, LOCATION};
use actix_web::{HttpRequest, HttpResponse};
use maud::Markup;

use crate::domain::CurrentUser;

use super::views;

pub const HX_REQUEST: &str = "HX-Request";
pub const HX_REDIRECT: &str = "HX-Redirect";

/// `true` when the request was issued by HTMX.
pub fn is_htmx(req: &HttpRequest) -> bool {
    req.headers()
        .get(HX_REQUEST)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// An HTML response rendering `body`.
pub fn html(status: StatusCode, body: Markup) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body.into_string())
}

/// `fragment` alone for HTMX, otherwise `page` inside the layout.
pub fn render(
    req: &HttpRequest,
    status: StatusCode,
    title: &str,
    user: &CurrentUser,
    fragment: Markup,
    page: impl FnOnce(Markup) -> Markup,
) -> HttpResponse {
    if is_htmx(req) {
        html(status, fragment)
    } else {
        html(status, views::layout(title, user, page(fragment)))
    }
}

/// A page for a signed-in caller that must not be cached.
pub fn private(mut response: HttpResponse) -> HttpResponse {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Navigate to `location`: `HX-Redirect` for HTMX, `303 See Other` otherwise.
pub fn redirect(req: &HttpRequest, location: &str) -> HttpResponse {
    if is_htmx(req) {
        HttpResponse::Ok()
            .insert_header((HX_REDIRECT, location.to_owned()))
            .finish()
    } else {
        HttpResponse::SeeOther()
            .insert_header((LOCATION, location.to_owned()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case(Some("true"), true)]
    #[case(Some("TRUE"), true)]
    #[case(Some("false"), false)]
    #[case(None, false)]
    fn detects_htmx_header(#[case] header: Option<&str>, #[case] expected: bool) {
        let mut req = TestRequest::default();
        if let Some(value) = header {
            req = req.insert_header((HX_REQUEST, value));
        }
        assert_eq!(is_htmx(&req.to_http_request()), expected);
    }

    #[rstest]
    fn htmx_redirects_use_header() {
        let req = TestRequest::default()
            .insert_header((HX_REQUEST, "true"))
            .to_http_request();
        let res = redirect(&req, "/roasters/1");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(HX_REDIRECT).and_then(|v| v.to_str().ok()),
            Some("/roasters/1")
        );
    }

    #[rstest]
    fn browser_redirects_use_see_other() {
        let req = TestRequest::default().to_http_request();
        let res = redirect(&req, "/");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/")
        );
    }

    #[actix_web::test]
    async fn render_wraps_full_pages_only() {
        let plain = TestRequest::default().to_http_request();
        let res = render(
            &plain,
            StatusCode::OK,
            "Beans",
            &CurrentUser::Anonymous,
            maud::html! { p { "x" } },
            |f| f,
        );
        let htmx = TestRequest::default()
            .insert_header((HX_REQUEST, "true"))
            .to_http_request();
        let fragment = render(
            &htmx,
            StatusCode::OK,
            "Beans",
            &CurrentUser::Anonymous,
            maud::html! { p { "x" } },
            |f| f,
        );
        let page = body_text(res).await;
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<main><p>x</p></main>"));
        assert_eq!(
            fragment
                .headers()
                .get(actix_web::http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(body_text(fragment).await, "<p>x</p>");
    }

    async fn body_text(res: HttpResponse) -> String {
        let bytes = actix_web::body::to_bytes(res.into_body())
            .await
            .expect("readable body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }
}
