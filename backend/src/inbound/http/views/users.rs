//! Signup and login forms.

use maud::{Markup, html};

use crate::domain::Validator;

use super::{input_field, non_field_errors};

/// Signup form; the password is never echoed back.
pub fn signup_form(name: &str, email: &str, errors: &Validator) -> Markup {
    html! {
        form id="signup-form" method="post" action="/user/signup" hx-post="/user/signup"
            hx-target="this" hx-swap="outerHTML" {
            (non_field_errors(errors))
            (input_field("Name", "name", "text", name, errors))
            (input_field("Email", "email", "email", email, errors))
            (input_field("Password", "password", "password", "", errors))
            button type="submit" { "Sign up" }
        }
    }
}

/// Login form; the password is never echoed back.
pub fn login_form(email: &str, errors: &Validator) -> Markup {
    html! {
        form id="login-form" method="post" action="/user/login" hx-post="/user/login"
            hx-target="this" hx-swap="outerHTML" {
            (non_field_errors(errors))
            (input_field("Email", "email", "email", email, errors))
            (input_field("Password", "password", "password", "", errors))
            button type="submit" { "Log in" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn login_form_shows_generic_failure() {
        let mut errors = Validator::new();
        errors.add_non_field_error("Email or password is incorrect");
        let html = login_form("ada@example.com", &errors).into_string();
        assert!(html.contains("Email or password is incorrect"));
        assert!(html.contains(r#"value="ada@example.com""#));
    }

    #[rstest]
    fn signup_form_never_echoes_password() {
        let html = signup_form("Ada", "ada@example.com", &Validator::new()).into_string();
        assert!(html.contains(r#"name="password" type="password" value="""#));
    }
}
