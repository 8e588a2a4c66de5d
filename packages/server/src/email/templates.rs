//! Transactional email bodies.

pub const ACTIVATION_SUBJECT: &str = "Please activate your account";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

/// HTML-escape user-provided text before it lands in an email body.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn activation_email(name: &str, activation_link: &str) -> String {
    format!(
        "<html><body>\
         <h2>Welcome, {name}!</h2>\
         <p>Thank you for signing up. Please activate your account by \
         clicking the link below:</p>\
         <p><a href=\"{link}\">Activate my account</a></p>\
         <p>If you did not create this account, you can ignore this \
         email.</p>\
         </body></html>",
        name = escape(name),
        link = activation_link,
    )
}

pub fn password_reset_email(name: &str, reset_link: &str) -> String {
    format!(
        "<html><body>\
         <h2>Hello, {name}</h2>\
         <p>We received a request to reset your password. Click the link \
         below to choose a new one:</p>\
         <p><a href=\"{link}\">Reset my password</a></p>\
         <p>If you did not request a password reset, you can ignore this \
         email.</p>\
         </body></html>",
        name = escape(name),
        link = reset_link,
    )
}
