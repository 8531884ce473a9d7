//! Bean pages.
//!
//! ```text
//! GET    /beans            list (HTMX: table fragment)
//! GET    /beans/new        create form            beans:write
//! POST   /beans[/new]      create                 beans:write
//! GET    /beans/{id}       detail with roaster
//! GET    /beans/{id}/edit  edit form              beans:write
//! PATCH  /beans/{id}       update (PUT too)       beans:write
//! DELETE /beans/{id}       delete                 beans:write
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, route, web};
use serde::Deserialize;

use crate::domain::{
    BEANS_WRITE, BeanForm, BeanSortColumn, CurrentUser, FormError, Roaster, SearchParams,
    SearchQuery, Validator,
};

use super::HttpResult;
use super::auth::{has_permission, require_permission};
use super::htmx::{private, redirect, render};
use super::params::{EntityId, parse_version};
use super::state::HttpState;
use super::views::{self, FormMode};

/// Edit submission: the bean fields plus the version the editor loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeanUpdate {
    #[serde(flatten)]
    pub form: BeanForm,
    #[serde(default)]
    pub version: String,
}

struct FormView<'a> {
    form: &'a BeanForm,
    errors: &'a Validator,
    mode: FormMode,
    roasters: &'a [Roaster],
}

fn form_response(
    req: &HttpRequest,
    status: StatusCode,
    current: &CurrentUser,
    view: FormView<'_>,
) -> HttpResponse {
    let title = match view.mode {
        FormMode::Create => "New bean",
        FormMode::Edit { .. } => "Edit bean",
    };
    let mode = view.mode;
    private(render(
        req,
        status,
        title,
        current,
        views::beans::form(view.form, view.errors, mode, view.roasters),
        |fragment| views::beans::form_page(fragment, mode),
    ))
}

#[get("/beans")]
pub async fn list_beans(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    params: web::Query<SearchParams>,
) -> HttpResult<HttpResponse> {
    let can_write = has_permission(&state.accounts, &current, BEANS_WRITE).await?;
    match SearchQuery::<BeanSortColumn>::from_params(&params) {
        Ok(query) => {
            let beans = state.beans.list_with_roasters(&query).await?;
            let sort = query.sort().to_string();
            Ok(render(
                &req,
                StatusCode::OK,
                "Beans",
                &current,
                views::beans::table(&beans),
                |_| views::beans::list(query.term(), &sort, &Validator::new(), &beans, can_write),
            ))
        }
        Err(errors) => {
            let term = params.term.as_deref().unwrap_or_default();
            let sort = params.sort.as_deref().unwrap_or_default();
            Ok(render(
                &req,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Beans",
                &current,
                views::invalid_search(views::beans::TABLE_ID, &errors),
                |_| views::beans::list(term, sort, &errors, &[], can_write),
            ))
        }
    }
}

#[get("/beans/new")]
pub async fn new_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, BEANS_WRITE).await?;
    let roasters = state.beans.roaster_options().await?;
    Ok(form_response(
        &req,
        StatusCode::OK,
        &current,
        FormView {
            form: &BeanForm::default(),
            errors: &Validator::new(),
            mode: FormMode::Create,
            roasters: &roasters,
        },
    ))
}

async fn create(
    req: &HttpRequest,
    state: &HttpState,
    current: &CurrentUser,
    form: &BeanForm,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, current, BEANS_WRITE).await?;
    match state.beans.create(form).await {
        Ok(bean) => Ok(redirect(req, &format!("/beans/{}", bean.id))),
        Err(FormError::Invalid(errors)) => {
            let roasters = state.beans.roaster_options().await?;
            Ok(form_response(
                req,
                StatusCode::UNPROCESSABLE_ENTITY,
                current,
                FormView {
                    form,
                    errors: &errors,
                    mode: FormMode::Create,
                    roasters: &roasters,
                },
            ))
        }
        Err(FormError::Failed(err)) => Err(err),
    }
}

#[post("/beans")]
pub async fn create_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    form: web::Form<BeanForm>,
) -> HttpResult<HttpResponse> {
    create(&req, &state, &current, &form).await
}

#[post("/beans/new")]
pub async fn create_bean_from_new(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    form: web::Form<BeanForm>,
) -> HttpResult<HttpResponse> {
    create(&req, &state, &current, &form).await
}

#[get("/beans/{id}")]
pub async fn show_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    let detail = state.beans.detail(id).await?;
    let can_write = has_permission(&state.accounts, &current, BEANS_WRITE).await?;
    let content = views::beans::detail(&detail, can_write);
    Ok(render(
        &req,
        StatusCode::OK,
        &detail.bean.name,
        &current,
        content,
        |page| page,
    ))
}

#[get("/beans/{id}/edit")]
pub async fn edit_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, BEANS_WRITE).await?;
    let bean = state.beans.find(id).await?;
    let roasters = state.beans.roaster_options().await?;
    Ok(form_response(
        &req,
        StatusCode::OK,
        &current,
        FormView {
            form: &BeanForm::from(&bean),
            errors: &Validator::new(),
            mode: FormMode::Edit {
                id,
                version: bean.version,
            },
            roasters: &roasters,
        },
    ))
}

/// Apply an edit if the submitted version is still current; 409 otherwise.
#[route("/beans/{id}", method = "PATCH", method = "PUT")]
pub async fn update_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
    body: web::Form<BeanUpdate>,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, BEANS_WRITE).await?;
    let version = parse_version(&body.version)?;
    match state.beans.update(id, version, &body.form).await {
        Ok(bean) => Ok(redirect(&req, &format!("/beans/{}", bean.id))),
        Err(FormError::Invalid(errors)) => {
            let roasters = state.beans.roaster_options().await?;
            Ok(form_response(
                &req,
                StatusCode::UNPROCESSABLE_ENTITY,
                &current,
                FormView {
                    form: &body.form,
                    errors: &errors,
                    mode: FormMode::Edit { id, version },
                    roasters: &roasters,
                },
            ))
        }
        Err(FormError::Failed(err)) => Err(err),
    }
}

#[delete("/beans/{id}")]
pub async fn delete_bean(
    req: HttpRequest,
    state: web::Data<HttpState>,
    current: CurrentUser,
    EntityId(id): EntityId,
) -> HttpResult<HttpResponse> {
    require_permission(&state.accounts, &current, BEANS_WRITE).await?;
    state.beans.delete(id).await?;
    Ok(redirect(&req, "/beans"))
}

/// Register bean routes; `/beans/new` must precede `/beans/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_beans)
        .service(new_bean)
        .service(create_bean)
        .service(create_bean_from_new)
        .service(edit_bean)
        .service(show_bean)
        .service(update_bean)
        .service(delete_bean);
}

#[cfg(test)]
#[path = "beans_tests.rs"]
mod tests;
