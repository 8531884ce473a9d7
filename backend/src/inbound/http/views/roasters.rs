//! Roaster pages and fragments.

use maud::{Markup, html};

use crate::domain::search::allowed_directives;
use crate::domain::{Roaster, RoasterDetail, RoasterForm, RoasterSortColumn, Validator};

use super::{FormMode, input_field, non_field_errors, search_form, textarea_field, titled};

/// Element id HTMX swaps when the search changes.
pub const TABLE_ID: &str = "roaster-table";

/// The results table; also the HTMX response for list requests.
pub fn table(roasters: &[Roaster]) -> Markup {
    html! {
        div id=(TABLE_ID) {
            @if roasters.is_empty() {
                p.empty { "No roasters found." }
            } @else {
                table {
                    thead { tr { th { "Name" } th { "Location" } th { "Website" } } }
                    tbody {
                        @for roaster in roasters {
                            tr {
                                td { a href={ "/roasters/" (roaster.id) } { (roaster.name) } }
                                td { (roaster.location) }
                                td { (roaster.website) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Full list page content.
pub fn list(term: &str, sort: &str, errors: &Validator, roasters: &[Roaster], can_write: bool) -> Markup {
    html! {
        header {
            h1 { "Roasters" }
            @if can_write {
                a.button href="/roasters/new" { "New roaster" }
            }
        }
        (search_form(
            "/roasters",
            TABLE_ID,
            term,
            sort,
            &allowed_directives::<RoasterSortColumn>(),
            errors,
        ))
        (table(roasters))
    }
}

/// Roaster detail with its beans.
pub fn detail(detail: &RoasterDetail, can_write: bool) -> Markup {
    let roaster = &detail.roaster;
    html! {
        article {
            h1 { (roaster.name) }
            @if can_write {
                div.actions {
                    a.button href={ "/roasters/" (roaster.id) "/edit" } { "Edit" }
                    button.danger hx-delete={ "/roasters/" (roaster.id) }
                        hx-confirm="Delete this roaster and all of its beans?" { "Delete" }
                }
            }
            dl {
                dt { "Location" } dd { (roaster.location) }
                dt { "Website" }
                dd { a href=(roaster.website) rel="noopener" { (roaster.website) } }
                dt { "Added" } dd { (roaster.created_at.format("%Y-%m-%d").to_string()) }
            }
            p { (roaster.description) }
            h2 { "Beans" }
            @if detail.beans.is_empty() {
                p.empty { "No beans yet." }
            } @else {
                ul {
                    @for bean in &detail.beans {
                        li {
                            a href={ "/beans/" (bean.id) } { (bean.name) }
                            " "
                            span.tag { (bean.roast_level.as_str()) }
                        }
                    }
                }
            }
        }
    }
}

/// Create or edit form; also the HTMX response for a rejected submission.
pub fn form(form: &RoasterForm, errors: &Validator, mode: FormMode) -> Markup {
    mode.form(
        "roaster-form",
        "/roasters",
        html! {
            (non_field_errors(errors))
            (input_field("Name", "name", "text", &form.name, errors))
            (textarea_field("Description", "description", &form.description, errors))
            (input_field("Website", "website", "url", &form.website, errors))
            (input_field("Location", "location", "text", &form.location, errors))
        },
    )
}

/// Page content wrapping [`form`].
pub fn form_page(form_html: Markup, mode: FormMode) -> Markup {
    let heading = match mode {
        FormMode::Create => "New roaster",
        FormMode::Edit { .. } => "Edit roaster",
    };
    titled(heading, form_html)
}
