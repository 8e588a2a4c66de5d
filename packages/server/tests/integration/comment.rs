use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use server::entity::comment;

use crate::common::{TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn any_active_user_can_comment() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let reader = app
            .create_activated_user("reader", "reader@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                &routes::blog_post_comments(post),
                &json!({"content": "First!"}),
                &reader,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["content"], "First!");
        assert_eq!(res.body["username"], "reader");
        assert!(res.body["reply_to"].is_null());
    }

    #[tokio::test]
    async fn anonymous_users_cannot_comment() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;

        let res = app
            .post_without_token(&routes::blog_post_comments(post), &json!({"content": "Hi"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn commenting_on_a_missing_post_is_not_found() {
        let app = TestApp::spawn().await;
        let reader = app
            .create_activated_user("reader", "reader@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                &routes::blog_post_comments(9999),
                &json!({"content": "Hi"}),
                &reader,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn content_over_a_thousand_chars_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;

        let res = app
            .post_with_token(
                &routes::blog_post_comments(post),
                &json!({"content": "x".repeat(1001)}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod replies {
    use super::*;

    #[tokio::test]
    async fn replies_thread_under_a_comment_on_the_same_post() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let parent = app.create_comment(&admin, post, "Parent").await;

        let reply = app.create_reply(&admin, post, parent, "Child").await;

        let res = app.get_without_token(&routes::comment(reply)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["reply_to"], parent);
    }

    #[tokio::test]
    async fn a_reply_cannot_target_a_comment_on_another_post() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post_a = app.create_blog_post(&admin, "A", "a").await;
        let post_b = app.create_blog_post(&admin, "B", "b").await;
        let on_a = app.create_comment(&admin, post_a, "On A").await;

        let res = app
            .post_with_token(
                &routes::blog_post_comments(post_b),
                &json!({"content": "Cross-post reply", "reply_to": on_a}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Reply target is not a comment on this blog post"
        );
    }

    #[tokio::test]
    async fn a_reply_to_a_missing_comment_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;

        let res = app
            .post_with_token(
                &routes::blog_post_comments(post),
                &json!({"content": "Hi", "reply_to": 9999}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_reply_tree() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let parent = app.create_comment(&admin, post, "Parent").await;
        let child = app.create_reply(&admin, post, parent, "Child").await;
        app.create_reply(&admin, post, child, "Grandchild").await;
        let unrelated = app.create_comment(&admin, post, "Unrelated").await;

        let res = app.delete_with_token(&routes::comment(parent), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let remaining = comment::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(remaining, 1);
        let res = app.get_without_token(&routes::comment(unrelated)).await;
        assert_eq!(res.status, 200);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn only_the_author_may_update_a_comment() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let author = app
            .create_activated_user("author", "author@example.com", "securepass")
            .await;
        let other = app
            .create_activated_user("other", "other@example.com", "securepass")
            .await;
        let id = app.create_comment(&author, post, "Original").await;

        let res = app
            .patch_with_token(
                &routes::blog_post_comment(post, id),
                &json!({"content": "Hijacked"}),
                &other,
            )
            .await;
        assert_eq!(res.status, 403);

        // Superusers cannot edit other people's comments either.
        let res = app
            .patch_with_token(
                &routes::blog_post_comment(post, id),
                &json!({"content": "Hijacked"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(
                &routes::blog_post_comment(post, id),
                &json!({"content": "Edited"}),
                &author,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["content"], "Edited");
    }

    #[tokio::test]
    async fn updating_refreshes_the_comment_timestamp() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let id = app.create_comment(&admin, post, "Original").await;

        let before = app.get_without_token(&routes::comment(id)).await;
        let original_date = before.body["comment_date"].as_str().unwrap().to_string();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // An empty PATCH still bumps the timestamp.
        let res = app
            .patch_with_token(&routes::blog_post_comment(post, id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_ne!(res.body["comment_date"].as_str().unwrap(), original_date);
    }

    #[tokio::test]
    async fn authors_and_superusers_may_delete() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        let author = app
            .create_activated_user("author", "author@example.com", "securepass")
            .await;
        let other = app
            .create_activated_user("other", "other@example.com", "securepass")
            .await;

        let by_author = app.create_comment(&author, post, "Mine").await;
        let for_admin = app.create_comment(&author, post, "Admin's target").await;

        let res = app
            .delete_with_token(&routes::blog_post_comment(post, by_author), &other)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .delete_with_token(&routes::blog_post_comment(post, by_author), &author)
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .delete_with_token(&routes::blog_post_comment(post, for_admin), &admin)
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn scoped_operations_reject_a_comment_from_another_post() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post_a = app.create_blog_post(&admin, "A", "a").await;
        let post_b = app.create_blog_post(&admin, "B", "b").await;
        let on_a = app.create_comment(&admin, post_a, "On A").await;

        let res = app
            .patch_with_token(
                &routes::blog_post_comment(post_b, on_a),
                &json!({"content": "Edited"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Comment does not belong to this blog post");

        let res = app
            .delete_with_token(&routes::blog_post_comment(post_b, on_a), &admin)
            .await;
        assert_eq!(res.status, 400);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn the_global_comment_list_is_admin_only() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let member = app
            .create_activated_user("bob", "bob@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        app.create_comment(&member, post, "Hello").await;

        let res = app.get_with_token(routes::COMMENTS, &member).await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(routes::COMMENTS, &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 1);
    }

    #[tokio::test]
    async fn a_posts_comments_are_public() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        let post = app.create_blog_post(&admin, "Post", "post").await;
        app.create_comment(&admin, post, "One").await;
        app.create_comment(&admin, post, "Two").await;

        let res = app.get_without_token(&routes::blog_post_comments(post)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 2);
        // Oldest first, ready for threading.
        assert_eq!(res.body["data"][0]["content"], "One");
    }
}
