//! Bean pages and fragments.

use maud::{Markup, html};

use crate::domain::search::allowed_directives;
use crate::domain::{
    BeanDetail, BeanForm, BeanListing, BeanSortColumn, RoastLevel, Roaster, Validator,
};

use super::{FormMode, input_field, non_field_errors, search_form, select_field, titled};

/// Element id HTMX swaps when the search changes.
pub const TABLE_ID: &str = "bean-table";

/// The results table; also the HTMX response for list requests.
pub fn table(beans: &[BeanListing]) -> Markup {
    html! {
        div id=(TABLE_ID) {
            @if beans.is_empty() {
                p.empty { "No beans found." }
            } @else {
                table {
                    thead { tr { th { "Name" } th { "Roast" } th { "Roaster" } } }
                    tbody {
                        @for listing in beans {
                            @let bean = &listing.bean;
                            tr {
                                td { a href={ "/beans/" (bean.id) } { (bean.name) } }
                                td { (bean.roast_level.as_str()) }
                                td {
                                    a href={ "/roasters/" (bean.roaster_id) } {
                                        @match &listing.roaster_name {
                                            Some(name) => { (name) }
                                            None => { "#" (bean.roaster_id) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Full list page content.
pub fn list(
    term: &str,
    sort: &str,
    errors: &Validator,
    beans: &[BeanListing],
    can_write: bool,
) -> Markup {
    html! {
        header {
            h1 { "Beans" }
            @if can_write {
                a.button href="/beans/new" { "New bean" }
            }
        }
        (search_form(
            "/beans",
            TABLE_ID,
            term,
            sort,
            &allowed_directives::<BeanSortColumn>(),
            errors,
        ))
        (table(beans))
    }
}

/// Bean detail naming its roaster.
pub fn detail(detail: &BeanDetail, can_write: bool) -> Markup {
    let bean = &detail.bean;
    html! {
        article {
            h1 { (bean.name) }
            @if can_write {
                div.actions {
                    a.button href={ "/beans/" (bean.id) "/edit" } { "Edit" }
                    button.danger hx-delete={ "/beans/" (bean.id) }
                        hx-confirm="Delete this bean?" { "Delete" }
                }
            }
            dl {
                dt { "Roast" } dd { (bean.roast_level.as_str()) }
                dt { "Roaster" }
                dd { a href={ "/roasters/" (detail.roaster.id) } { (detail.roaster.name) } }
                dt { "Added" } dd { (bean.created_at.format("%Y-%m-%d").to_string()) }
            }
        }
    }
}

/// Create or edit form; `roasters` fills the roaster selector.
pub fn form(form: &BeanForm, errors: &Validator, mode: FormMode, roasters: &[Roaster]) -> Markup {
    let levels: Vec<(String, String)> = RoastLevel::ALL
        .iter()
        .map(|level| (level.as_str().to_owned(), level.as_str().to_owned()))
        .collect();
    let roaster_options: Vec<(String, String)> = roasters
        .iter()
        .map(|roaster| (roaster.id.to_string(), roaster.name.clone()))
        .collect();

    mode.form(
        "bean-form",
        "/beans",
        html! {
            (non_field_errors(errors))
            (input_field("Name", "name", "text", &form.name, errors))
            (select_field("Roast level", "roast_level", form.roast_level.trim(), &levels, errors))
            (select_field(
                "Roaster",
                "roaster_id",
                form.roaster_id.trim(),
                &roaster_options,
                errors,
            ))
        },
    )
}

/// Page content wrapping [`form`].
pub fn form_page(form_html: Markup, mode: FormMode) -> Markup {
    let heading = match mode {
        FormMode::Create => "New bean",
        FormMode::Edit { .. } => "Edit bean",
    };
    titled(heading, form_html)
}
