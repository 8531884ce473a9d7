//! HTTP inbound adapter serving the HTML catalogue.
//!
//! Handlers translate requests into service calls and render HTML with the
//! helpers in [`views`]. HTMX requests get fragments; see [`htmx`].

pub mod assets;
pub mod auth;
pub mod beans;
pub mod error;
pub mod health;
pub mod home;
pub mod htmx;
pub mod params;
pub mod roasters;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod views;

use actix_web::web;

use crate::domain::Error;

pub use error::HttpResult;

/// Register every page route plus form and query decoding limits.
///
/// Undecodable bodies and query strings are reported as 400.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::FormConfig::default()
            .limit(16 * 1024)
            .error_handler(|err, _req| Error::invalid_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| Error::invalid_request(err.to_string()).into()),
    )
    .service(home::home)
    .service(assets::asset)
    .configure(roasters::configure)
    .configure(beans::configure)
    .configure(users::configure);
}
