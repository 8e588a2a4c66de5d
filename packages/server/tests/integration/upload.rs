use serde_json::json;

use crate::common::{TestApp, routes};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image payload";

mod uploading {
    use super::*;

    #[tokio::test]
    async fn uploads_are_admin_only() {
        let app = TestApp::spawn().await;
        let member = app
            .create_activated_user("bob", "bob@example.com", "securepass")
            .await;

        let res = app
            .upload_with_token(
                routes::IMAGES,
                "photo.png",
                "image/png",
                PNG_BYTES.to_vec(),
                &member,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn a_valid_image_is_stored_and_served() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app
            .upload_with_token(
                routes::IMAGES,
                "photo.png",
                "image/png",
                PNG_BYTES.to_vec(),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["filename"], "photo.png");
        assert_eq!(res.body["size"], PNG_BYTES.len());
        assert_eq!(res.body["url"], "/uploads/photo.png");

        assert!(app.uploads_dir.path().join("photo.png").exists());

        // And the static file route serves it back.
        let served = app.get_without_token("/uploads/photo.png").await;
        assert_eq!(served.status, 200);
    }

    #[tokio::test]
    async fn non_image_content_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app
            .upload_with_token(
                routes::IMAGES,
                "notes.txt",
                "text/plain",
                b"just text".to_vec(),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "File must be an image");
    }

    #[tokio::test]
    async fn disallowed_extensions_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app
            .upload_with_token(
                routes::IMAGES,
                "vector.svg",
                "image/svg+xml",
                b"<svg/>".to_vec(),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn a_name_collision_gets_a_suffix_instead_of_overwriting() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let first = app
            .upload_with_token(
                routes::IMAGES,
                "photo.png",
                "image/png",
                PNG_BYTES.to_vec(),
                &admin,
            )
            .await;
        assert_eq!(first.status, 201);

        let second = app
            .upload_with_token(
                routes::IMAGES,
                "photo.png",
                "image/png",
                PNG_BYTES.to_vec(),
                &admin,
            )
            .await;
        assert_eq!(second.status, 201, "{}", second.text);

        let name = second.body["filename"].as_str().unwrap();
        assert_ne!(name, "photo.png");
        assert!(name.starts_with("photo_") && name.ends_with(".png"), "{name}");
        assert!(app.uploads_dir.path().join("photo.png").exists());
        assert!(app.uploads_dir.path().join(name).exists());
    }
}

mod listing_and_deletion {
    use super::*;

    #[tokio::test]
    async fn listed_images_carry_size_and_url() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        app.upload_with_token(
            routes::IMAGES,
            "photo.png",
            "image/png",
            PNG_BYTES.to_vec(),
            &admin,
        )
        .await;

        let res = app.get_with_token(routes::IMAGES, &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["filename"], "photo.png");
        assert_eq!(res.body["data"][0]["url"], "/uploads/photo.png");
    }

    #[tokio::test]
    async fn deletion_removes_the_file() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;
        app.upload_with_token(
            routes::IMAGES,
            "photo.png",
            "image/png",
            PNG_BYTES.to_vec(),
            &admin,
        )
        .await;

        let res = app.delete_with_token(&routes::image("photo.png"), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(!app.uploads_dir.path().join("photo.png").exists());
    }

    #[tokio::test]
    async fn deleting_a_missing_image_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app.delete_with_token(&routes::image("ghost.png"), &admin).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn hidden_filenames_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app.delete_with_token(&routes::image(".hidden"), &admin).await;

        assert_eq!(res.status, 400);
    }
}

// Exercise the JSON upload rejection path: a POST without multipart body.
mod malformed_requests {
    use super::*;

    #[tokio::test]
    async fn a_missing_multipart_body_is_a_bad_request() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_superuser("admin", "admin@example.com", "securepass")
            .await;

        let res = app.post_with_token(routes::IMAGES, &json!({}), &admin).await;

        assert_eq!(res.status, 400);
    }
}
