use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{blog_post, comment, tag};

use crate::common::{TestApp, routes};

mod public_reads {
    use super::*;

    #[tokio::test]
    async fn anyone_can_list_blog_posts() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        app.create_blog_post(&admin, "First post", "first-post").await;
        app.create_blog_post(&admin, "Second post", "second-post")
            .await;

        let res = app.get_without_token(routes::BLOGPOSTS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 2);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listing_supports_title_search() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        app.create_blog_post(&admin, "Rust ownership explained", "rust-ownership")
            .await;
        app.create_blog_post(&admin, "Gardening tips", "gardening")
            .await;

        let res = app
            .get_without_token(&format!("{}?search=RUST", routes::BLOGPOSTS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["title"], "Rust ownership explained");
    }

    #[tokio::test]
    async fn article_page_carries_tags_and_comment_usernames() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let tag_id = app.create_tag(&admin, "rust").await;

        let created = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({
                    "title": "Tagged post",
                    "url": "tagged-post",
                    "content": "Body",
                    "tags": [tag_id],
                }),
                &admin,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let post_id = created.id();

        let reader = app
            .create_activated_user("reader", "reader@example.com", "securepass")
            .await;
        app.create_comment(&reader, post_id, "Nice article").await;

        let res = app
            .get_without_token(&routes::blog_post_by_url("tagged-post"))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Tagged post");
        assert_eq!(res.body["tags"][0]["name"], "rust");
        assert_eq!(res.body["comments"][0]["content"], "Nice article");
        assert_eq!(res.body["comments"][0]["username"], "reader");
    }

    #[tokio::test]
    async fn unknown_url_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::blog_post_by_url("missing"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod admin_crud {
    use super::*;

    #[tokio::test]
    async fn creation_requires_a_superuser() {
        let app = TestApp::spawn().await;
        let member = app
            .create_activated_user("bob", "bob@example.com", "securepass")
            .await;

        let body = json!({"title": "T", "url": "t", "content": "C"});

        let res = app.post_without_token(routes::BLOGPOSTS, &body).await;
        assert_eq!(res.status, 401);

        let res = app.post_with_token(routes::BLOGPOSTS, &body, &member).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["message"], "The user does not have admin privileges");
    }

    #[tokio::test]
    async fn duplicate_title_or_url_conflicts() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        app.create_blog_post(&admin, "Original", "original").await;

        let res = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({"title": "Original", "url": "other", "content": "C"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({"title": "Other", "url": "original", "content": "C"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn a_missing_tag_id_fails_the_whole_creation() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let real_tag = app.create_tag(&admin, "real").await;

        let res = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({
                    "title": "Doomed",
                    "url": "doomed",
                    "content": "C",
                    "tags": [real_tag, 9999],
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Tag with ID 9999 not found");

        // The transaction rolled back: no post row was created.
        let posts = blog_post::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(posts, 0);
    }

    #[tokio::test]
    async fn updates_are_partial() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let id = app.create_blog_post(&admin, "Before", "before").await;

        let res = app
            .patch_with_token(
                &routes::blog_post(id),
                &json!({"title": "After"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "After");
        // Unspecified fields are untouched.
        assert_eq!(res.body["url"], "before");
        assert_eq!(res.body["content"], "Some long-form article content.");
    }

    #[tokio::test]
    async fn supplying_tags_replaces_the_full_set() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let old_tag = app.create_tag(&admin, "old").await;
        let new_tag = app.create_tag(&admin, "new").await;

        let created = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({"title": "T", "url": "t", "content": "C", "tags": [old_tag]}),
                &admin,
            )
            .await;
        let id = created.id();

        let res = app
            .patch_with_token(&routes::blog_post(id), &json!({"tags": [new_tag]}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let tags = res.body["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["name"], "new");
    }

    #[tokio::test]
    async fn image_path_can_be_cleared_with_null() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let created = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({
                    "title": "T",
                    "url": "t",
                    "content": "C",
                    "image_path": "/uploads/header.png",
                }),
                &admin,
            )
            .await;
        let id = created.id();
        assert_eq!(created.body["image_path"], "/uploads/header.png");

        let res = app
            .patch_with_token(&routes::blog_post(id), &json!({"image_path": null}), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["image_path"].is_null());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments_but_keeps_tags() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let tag_id = app.create_tag(&admin, "survivor").await;

        let created = app
            .post_with_token(
                routes::BLOGPOSTS,
                &json!({"title": "T", "url": "t", "content": "C", "tags": [tag_id]}),
                &admin,
            )
            .await;
        let id = created.id();
        app.create_comment(&admin, id, "Doomed comment").await;

        let res = app.delete_with_token(&routes::blog_post(id), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let comments = comment::Entity::find()
            .filter(comment::Column::BlogPostId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(comments, 0);

        let tags = tag::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(tags, 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_post_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app
            .delete_with_token(&routes::blog_post(9999), &admin)
            .await;

        assert_eq!(res.status, 404);
    }
}
