use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/blogposts", blog_post_routes())
        .nest("/tags", tag_routes())
        .nest("/comments", comment_routes())
        .nest("/uploads", upload_routes())
        .routes(routes!(handlers::sitemap::get_sitemap))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::activate))
        .routes(routes!(handlers::auth::password_recovery))
        .routes(routes!(handlers::auth::reset_password))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::user::list_users,
            handlers::user::create_user
        ))
        .routes(routes!(
            handlers::user::get_me,
            handlers::user::update_me,
            handlers::user::delete_me
        ))
        .routes(routes!(handlers::user::update_my_password))
        .routes(routes!(handlers::user::list_my_comments))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
        .routes(routes!(handlers::user::list_user_comments))
}

fn blog_post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::blog_post::list_blog_posts,
            handlers::blog_post::create_blog_post
        ))
        .routes(routes!(
            handlers::blog_post::get_blog_post,
            handlers::blog_post::update_blog_post,
            handlers::blog_post::delete_blog_post
        ))
        .routes(routes!(
            handlers::comment::list_blog_post_comments,
            handlers::comment::create_comment
        ))
        .routes(routes!(
            handlers::comment::update_comment,
            handlers::comment::delete_blog_post_comment
        ))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::tag::list_tags,
            handlers::tag::create_tag
        ))
        .routes(routes!(
            handlers::tag::get_tag,
            handlers::tag::update_tag,
            handlers::tag::delete_tag
        ))
        .routes(routes!(handlers::tag::get_tag_blog_posts))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::comment::list_comments))
        .routes(routes!(
            handlers::comment::get_comment,
            handlers::comment::delete_comment
        ))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::upload_image,
            handlers::upload::list_images
        ))
        .routes(routes!(handlers::upload::delete_image))
        .layer(handlers::upload::upload_body_limit())
}
