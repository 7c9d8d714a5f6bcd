//! Server-rendered pages. Every interpolated value goes through [`escape`];
//! service error payloads are shown pretty-printed inside a `<pre>` block.

use crate::auth::{
    guard::SIGN_IN_PATH,
    types::{AuthUser, Session},
};
use serde_json::Value;

/// Escape text for HTML element and attribute context.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

fn error_block(error: Option<&str>) -> String {
    error.map_or_else(String::new, |error| {
        format!("<pre class=\"error\">{}</pre>", escape(error))
    })
}

fn credentials_form(action: &str, email: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\n\
         <input name=\"email\" type=\"email\" placeholder=\"Email\" autocapitalize=\"none\" value=\"{}\">\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" autocapitalize=\"none\">\n\
         <button type=\"submit\">{submit}</button>\n</form>",
        escape(email)
    )
}

#[must_use]
pub fn sign_in_page(email: &str, error: Option<&str>) -> String {
    let body = format!(
        "<main>\n{}\n<p>Don't have an account yet? <a href=\"/sign-up\">Create an account</a></p>\n{}\n</main>",
        credentials_form(SIGN_IN_PATH, email, "Sign In"),
        error_block(error)
    );
    layout("Sign in", &body)
}

#[must_use]
pub fn sign_up_page(email: &str, success: Option<&str>, error: Option<&str>) -> String {
    let success = success.map_or_else(String::new, |message| {
        format!("<p class=\"success\">{}</p>", escape(message))
    });
    let body = format!(
        "<main>\n{}\n<p>Already have an account? <a href=\"{SIGN_IN_PATH}\">Login</a></p>\n{success}\n{}\n</main>",
        credentials_form("/sign-up", email, "Sign Up"),
        error_block(error)
    );
    layout("Sign up", &body)
}

#[must_use]
pub fn home_page(user: &AuthUser, sessions: &[Session]) -> String {
    let mut body = String::from("<main>\n<section class=\"user\">\n<h1>");
    body.push_str(&escape(user.email().unwrap_or("Signed in")));
    body.push_str("</h1>\n<dl>\n");
    for (key, value) in user.attributes() {
        body.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>\n",
            escape(key),
            escape(&attribute_text(value))
        ));
    }
    body.push_str("</dl>\n</section>\n<section class=\"sessions\">\n<h2>Sessions</h2>\n<ul>\n");
    for session in sessions {
        let created = session.creation_dtm.as_deref().unwrap_or("unknown");
        let marker = if session.is_current {
            " <strong>(current)</strong>"
        } else {
            ""
        };
        body.push_str(&format!("<li>Created {}{marker}</li>\n", escape(created)));
    }
    body.push_str(
        "</ul>\n</section>\n<form method=\"post\" action=\"/api/auth/signOut\">\n\
         <button type=\"submit\">Sign Out</button>\n</form>\n</main>",
    );
    layout("Home", &body)
}

#[must_use]
pub fn loading_page() -> String {
    layout(
        "Loading",
        "<meta http-equiv=\"refresh\" content=\"1\">\n<label>Loading...</label>",
    )
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn sign_in_page_escapes_email_and_error() {
        let page = sign_in_page("\"><script>", Some("<b>bad</b>"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(page.contains("href=\"/sign-up\""));
    }

    #[test]
    fn sign_up_page_shows_success_message() {
        let page = sign_up_page("", Some("We sent a verification link to a@b.c"), None);
        assert!(page.contains("We sent a verification link to a@b.c"));
        assert!(!page.contains("class=\"error\""));
    }

    #[test]
    fn home_page_lists_attributes_and_marks_current_session() {
        let user: AuthUser =
            serde_json::from_value(json!({"email": "ada@example.com", "age": 36})).unwrap();
        let mut current = Session::new("a");
        current.is_current = true;
        current.creation_dtm = Some("2024-05-01".to_string());
        let other = Session::new("b");

        let page = home_page(&user, &[current, other]);
        assert!(page.contains("<h1>ada@example.com</h1>"));
        assert!(page.contains("<dt>age</dt><dd>36</dd>"));
        assert!(page.contains("Created 2024-05-01 <strong>(current)</strong>"));
        assert!(page.contains("Created unknown</li>"));
        assert!(page.contains("action=\"/api/auth/signOut\""));
    }

    #[test]
    fn loading_page_refreshes_itself() {
        let page = loading_page();
        assert!(page.contains("http-equiv=\"refresh\""));
        assert!(page.contains("Loading..."));
    }
}
