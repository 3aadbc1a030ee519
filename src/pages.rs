//! Embedded HTML documents served by the router.
//!
//! The index page and the error template are compiled into the binary so a
//! server process has no document root to misconfigure. The error template
//! carries a single substitution token that receives the error message.

use minijinja::{context, Environment};
use once_cell::sync::Lazy;

/// Landing page, served verbatim for `GET /` and `GET /index*`.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

const ERROR_TEMPLATE: &str = include_str!("../assets/error.html");

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("error", ERROR_TEMPLATE)
        .expect("error template");
    env
});

/// Render the error page with the message substituted in.
///
/// Template failures fall back to a bare document; an error response is the
/// one place where failing to respond is not an option.
pub fn render_error_page(message: &str) -> String {
    TEMPLATES
        .get_template("error")
        .and_then(|t| t.render(context! { error => message }))
        .unwrap_or_else(|_| format!("<html><body><pre>{message}</pre></body></html>"))
}
