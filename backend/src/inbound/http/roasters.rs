//! Roaster pages.
//!
//! ```text
//! GET    /roasters            list (HTMX: table fragment)
//! GET    /roasters/new        create form            roasters:write
//! POST   /roasters[/new]      create                 roasters:write
//! GET    /roasters/{id}       detail with beans
//! GET    /roasters/{id}/edit  edit form              roasters:write
//! PATCH  /roasters/{id}       update (PUT too)       roasters:write
//! DELETE /roasters/{id}       delete                 roasters:write
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, route, web};
use serde::Deserialize;

use crate::domain::{
    CurrentUser, FormError, ROASTERS_WRITE, RoasterForm, RoasterSortColumn, SearchParams,
    SearchQuery, Validator,
};

use super::HttpResult;
use super::auth::{has_permission, require_permission};
use super::htmx::{private, redirect, render};
use super::params::{EntityId, parse_version};
use super::state::HttpState;
use super::views::{self, FormMode};

/// Edit submission: the roaster fields plus the version the editor loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoasterUpdate {
    #[serde(flatten)]
    pub form: RoasterForm,
    #[serde(default)]
    pub version: String,
}

fn form_response(
    req: &HttpRequest,
    status: StatusCode,
    current: &CurrentUser,
    form: &RoasterForm,
    errors: &Validator,
    mode: FormMode,
) -> HttpResponse {
    let title = match mode {
        FormMode::Create => "New roaster",
        FormMode::Edit { .. } => "Edit roaster",
    };
    private(render(
        req,
        status,
        title,
        current,
        views::roasters::form(form, errors, mode),
        |fragment| views::roasters::form_page(fragment, mode),
    ))
}

/// List roasters matching `term`, ordered by `sort`.
#[get("/roasters")]
pub async fn list_roasters(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    params: web::Query<SearchParams>,
) -> HttpResult<HttpResponse> {
    let can_write = has_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    match SearchQuery::<RoasterSortColumn>::from_params(&params) {
        Ok(query) => {
            let roasters = state.roasters.list(&query).await?;
            let sort = query.sort().to_string();
            Ok(render(
                &req,
                StatusCode::OK,
                "Roasters",
                &current,
                views::roasters::table(&roasters),
                |_| views::roasters::list(query.term(), &sort, &Validator::new(), &roasters, can_write),
            ))
        }
        Err(errors) => {
            let term = params.term.as_deref().unwrap_or_default();
            let sort = params.sort.as_deref().unwrap_or_default();
            Ok(render(
                &req,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Roasters",
                &current,
                views::invalid_search(views::roasters::TABLE_ID, &errors),
                |_| views::roasters::list(term, sort, &errors, &[], can_write),
            ))
        }
    }
}

#[get("/roasters/new")]
pub async fn new_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    Ok(form_response(
        &req,
        StatusCode::OK,
        &current,
        &RoasterForm::default(),
        &Validator::new(),
        FormMode::Create,
    ))
}

async fn create(
    req: &HttpRequest,
    state: &HttpState,
    current: &CurrentUser,
    form: &RoasterForm,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, current, ROASTERS_WRITE).await?;
    match state.roasters.create(form).await {
        Ok(roaster) => Ok(redirect(req, &format!("/roasters/{}", roaster.id))),
        Err(FormError::Invalid(errors)) => Ok(form_response(
            req,
            StatusCode::UNPROCESSABLE_ENTITY,
            current,
            form,
            &errors,
            FormMode::Create,
        )),
        Err(FormError::Failed(err)) => Err(err),
    }
}

#[post("/roasters")]
pub async fn create_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    form: web::Form<RoasterForm>,
) -> HttpResult<HttpResponse> {
    create(&req, &state, &current, &form).await
}

/// Same as [`create_roaster`]; the create page posts back to itself.
#[post("/roasters/new")]
pub async fn create_roaster_from_new(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    form: web::Form<RoasterForm>,
) -> HttpResult<HttpResponse> {
    create(&req, &state, &current, &form).await
}

#[get("/roasters/{id}")]
pub async fn show_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    let detail = state.roasters.detail(id).await?;
    let can_write = has_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    let content = views::roasters::detail(&detail, can_write);
    Ok(render(
        &req,
        StatusCode::OK,
        &detail.roaster.name,
        &current,
        content,
        |page| page,
    ))
}

#[get("/roasters/{id}/edit")]
pub async fn edit_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    let roaster = state.roasters.find(id).await?;
    Ok(form_response(
        &req,
        StatusCode::OK,
        &current,
        &RoasterForm::from(&roaster),
        &Validator::new(),
        FormMode::Edit {
            id,
            version: roaster.version,
        },
    ))
}

/// Apply an edit if the submitted version is still current; 409 otherwise.
#[route("/roasters/{id}", method = "PATCH", method = "PUT")]
pub async fn update_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
    body: web::Form<RoasterUpdate>,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    let version = parse_version(&body.version)?;
    match state.roasters.update(id, version, &body.form).await {
        Ok(roaster) => Ok(redirect(&req, &format!("/roasters/{}", roaster.id))),
        Err(FormError::Invalid(errors)) => Ok(form_response(
            &req,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            &body.form,
            &errors,
            FormMode::Edit { id, version },
        )),
        Err(FormError::Failed(err)) => Err(err),
    }
}

/// Delete a roaster together with its beans.
#[delete("/roasters/{id}")]
pub async fn delete_roaster(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, ROASTERS_WRITE).await?;
    state.roasters.delete(id).await?;
    Ok(redirect(&req, "/roasters"))
}

/// Register roaster routes; `/roasters/new` must precede `/roasters/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_roasters)
        .service(new_roaster)
        .service(create_roaster)
        .service(create_roaster_from_new)
        .service(edit_roaster)
        .service(show_roaster)
        .service(update_roaster)
        .service(delete_roaster);
}

#[cfg(test)]
#[path = "roasters_tests.rs"]
mod tests;
