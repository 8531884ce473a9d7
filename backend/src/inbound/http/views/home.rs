//! Landing page.

use maud::{Markup, html};

use crate::domain::CurrentUser;

pub fn home(user: &CurrentUser) -> Markup {
    html! {
        h1 { "Roastery" }
        @match user.user() {
            Some(user) => {
                p { "Welcome back, " (user.name) "." }
            }
            None => {
                p { a href="/user/signup" { "Sign up" } " to start cataloguing." }
            }
        }
        ul.tiles {
            li { a href="/roasters" { "Browse roasters" } }
            li { a href="/beans" { "Browse beans" } }
        }
    }
}
