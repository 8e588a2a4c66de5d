use crate::common::{TestApp, routes};

#[tokio::test]
async fn the_sitemap_is_public_xml() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .get(format!("http://{}{}", app.addr, routes::SITEMAP))
        .send()
        .await
        .expect("Failed to fetch sitemap");

    assert_eq!(res.status().as_u16(), 200);
    let content_type = res
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/xml"), "{content_type}");

    let xml = res.text().await.expect("Failed to read sitemap body");
    assert!(xml.starts_with("<?xml"), "{xml}");
    assert!(xml.contains("<urlset"));
}

#[tokio::test]
async fn static_pages_are_always_listed() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::SITEMAP).await;

    assert_eq!(res.status, 200);
    assert!(res.text.contains("<loc>http://frontend.test/</loc>"));
    assert!(res.text.contains("<loc>http://frontend.test/articles</loc>"));
    assert!(res.text.contains("<loc>http://frontend.test/about</loc>"));
    assert!(res.text.contains("<loc>http://frontend.test/login</loc>"));
    assert!(res.text.contains("<priority>1.0</priority>"));
}

#[tokio::test]
async fn published_articles_appear_with_a_lastmod_date() {
    let app = TestApp::spawn().await;
    let admin = app
        .create_superuser("admin", "admin@example.com", "securepass")
        .await;
    app.create_blog_post(&admin, "Hello World", "hello-world").await;

    let res = app.get_without_token(routes::SITEMAP).await;

    assert_eq!(res.status, 200);
    assert!(
        res.text
            .contains("<loc>http://frontend.test/articles/hello-world</loc>"),
        "{}",
        res.text
    );
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    assert!(res.text.contains(&format!("<lastmod>{today}</lastmod>")));
}
