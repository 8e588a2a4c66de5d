pub mod auth;
pub mod blog_post;
pub mod comment;
pub mod shared;
pub mod tag;
pub mod upload;
pub mod user;
