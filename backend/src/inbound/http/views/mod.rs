//! Server-rendered HTML built with `maud`.
//!
//! Every splice is escaped by the `html!` macro, so values from users or the
//! database can be interpolated directly. Nothing here builds markup from
//! strings.

pub mod beans;
pub mod home;
pub mod roasters;
pub mod users;

use maud::{DOCTYPE, Markup, html};

use crate::domain::{CurrentUser, Validator};

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

fn nav(user: &CurrentUser) -> Markup {
    html! {
        nav {
            a.brand href="/" { "Roastery" }
            a href="/roasters" { "Roasters" }
            a href="/beans" { "Beans" }
            span.spacer {}
            @match user.user() {
                None => {
                    a href="/user/signup" { "Sign up" }
                    a href="/user/login" { "Log in" }
                }
                Some(user) => {
                    span.whoami { (user.name) }
                    form method="post" action="/user/logout" hx-post="/user/logout" {
                        button type="submit" { "Log out" }
                    }
                }
            }
        }
    }
}

/// Wrap `main` in the full document shell.
pub fn layout(title: &str, user: &CurrentUser, main: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Roastery" }
                link rel="stylesheet" href="/static/app.css";
                script src=(HTMX_SRC) defer {}
                script src="/static/app.js" defer {}
            }
            body {
                (nav(user))
                div id="flash" role="alert" {}
                main { (main) }
            }
        }
    }
}

/// `content` under a top-level heading.
pub fn titled(heading: &str, content: Markup) -> Markup {
    html! {
        h1 { (heading) }
        (content)
    }
}

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing carries the version the editor loaded.
    Edit { id: i64, version: i32 },
}

impl FormMode {
    /// A `<form>` for the resource rooted at `base`, e.g. `/roasters`.
    ///
    /// Create forms also work without JavaScript; edits go through
    /// `hx-patch` and carry the version as a hidden field.
    pub fn form(self, form_id: &str, base: &str, fields: Markup) -> Markup {
        let label = self.submit_label();
        match self {
            Self::Create => html! {
                form id=(form_id) method="post" action=(base) hx-post=(base)
                    hx-target="this" hx-swap="outerHTML" {
                    (fields)
                    button type="submit" { (label) }
                }
            },
            Self::Edit { id, version } => html! {
                form id=(form_id) hx-patch={ (base) "/" (id) }
                    hx-target="this" hx-swap="outerHTML" {
                    input type="hidden" name="version" value=(version);
                    (fields)
                    button type="submit" { (label) }
                }
            },
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Edit { .. } => "Save",
        }
    }
}

/// Form-wide messages; renders nothing when there are none.
pub fn non_field_errors(errors: &Validator) -> Markup {
    html! {
        @if !errors.non_field_errors().is_empty() {
            ul.form-errors {
                @for message in errors.non_field_errors() {
                    li { (message) }
                }
            }
        }
    }
}

fn field_error(errors: &Validator, name: &str) -> Markup {
    html! {
        @if let Some(message) = errors.field_error(name) {
            p.field-error { (message) }
        }
    }
}

/// A labelled `<input>` showing its submitted value and any error.
pub fn input_field(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: &Validator,
) -> Markup {
    html! {
        div.field {
            label for=(name) { (label) }
            input id=(name) name=(name) type=(kind) value=(value);
            (field_error(errors, name))
        }
    }
}

/// A labelled `<textarea>`.
pub fn textarea_field(label: &str, name: &str, value: &str, errors: &Validator) -> Markup {
    html! {
        div.field {
            label for=(name) { (label) }
            textarea id=(name) name=(name) rows="4" { (value) }
            (field_error(errors, name))
        }
    }
}

/// A labelled `<select>`; `options` are `(value, text)` pairs.
pub fn select_field(
    label: &str,
    name: &str,
    selected: &str,
    options: &[(String, String)],
    errors: &Validator,
) -> Markup {
    html! {
        div.field {
            label for=(name) { (label) }
            select id=(name) name=(name) {
                option value="" { "Choose…" }
                @for (value, text) in options {
                    option value=(value) selected[value == selected] { (text) }
                }
            }
            (field_error(errors, name))
        }
    }
}

/// Replacement for a results table when the search parameters are invalid.
pub fn invalid_search(table_id: &str, errors: &Validator) -> Markup {
    html! {
        div id=(table_id) {
            ul.form-errors {
                @for (field, message) in errors.field_errors() {
                    li { (field) ": " (message) }
                }
            }
        }
    }
}

/// Search box and sort selector that refresh `target` through HTMX.
pub fn search_form(
    action: &str,
    target: &str,
    term: &str,
    sort: &str,
    sorts: &[String],
    errors: &Validator,
) -> Markup {
    html! {
        form.search method="get" action=(action) hx-get=(action)
            hx-target={ "#" (target) } hx-swap="outerHTML" hx-push-url="true"
            hx-trigger="input changed delay:300ms from:input, change from:select, submit" {
            input type="search" name="term" value=(term) placeholder="Search";
            select name="sort" {
                @for directive in sorts {
                    option value=(directive) selected[directive == sort] { (directive) }
                }
            }
            button type="submit" { "Search" }
            (field_error(errors, "term"))
            (field_error(errors, "sort"))
        }
    }
}
