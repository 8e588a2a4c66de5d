pub mod blog_post;
pub mod blog_post_tag;
pub mod comment;
pub mod tag;
pub mod user;
