mod mailer;
pub mod templates;

pub use mailer::Mailer;
