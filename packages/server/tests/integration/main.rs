mod common;

mod auth;
mod blog_post;
mod comment;
mod sitemap;
mod upload;
