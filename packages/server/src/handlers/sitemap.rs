use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::blog_post;
use crate::error::AppError;
use crate::state::AppState;

/// Static frontend pages with their change frequency and priority.
const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("/", "monthly", "1.0"),
    ("/articles", "monthly", "0.9"),
    ("/about", "yearly", "0.8"),
    ("/signup", "yearly", "0.2"),
    ("/login", "yearly", "0.2"),
];

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = "Sitemap",
    operation_id = "getSitemap",
    summary = "Sitemap of the frontend pages and every blog post",
    responses(
        (status = 200, description = "Sitemap XML", content_type = "application/xml"),
    ),
)]
#[instrument(skip(state))]
pub async fn get_sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = blog_post::Entity::find()
        .order_by_desc(blog_post::Column::PublicationDate)
        .all(&state.db)
        .await?;

    let frontend = &state.config.server.frontend_host;
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for (path, changefreq, priority) in STATIC_PAGES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{frontend}{path}</loc>\n    <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }

    for post in posts {
        xml.push_str(&format!(
            "  <url>\n    <loc>{frontend}/articles/{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>monthly</changefreq>\n    <priority>0.9</priority>\n  </url>\n",
            post.url,
            post.publication_date.format("%Y-%m-%d"),
        ));
    }

    xml.push_str("</urlset>");

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}
