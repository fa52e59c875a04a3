use reqwest::Method;

use crate::common::{TestApp, TestResponse, routes};

async fn create_item(
    app: &TestApp,
    token: &str,
    title: &str,
    category: &str,
    extra: &[(&str, &str)],
) -> TestResponse {
    let mut fields = vec![("title", title), ("category", category)];
    fields.extend_from_slice(extra);
    app.multipart_with_token(
        Method::POST,
        routes::GALLERY,
        &fields,
        &[("image", "shot.png")],
        token,
    )
    .await
}

mod gallery_crud {
    use super::*;

    #[tokio::test]
    async fn created_item_lands_in_the_category_folder() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = create_item(&app, &token, "Pit stop", "competitions", &[]).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["image"]["public_id"]
            .as_str()
            .unwrap()
            .starts_with("gallery/competitions/"));
        assert_eq!(app.store.count_in_folder("gallery/competitions"), 1);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected_without_uploading() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = create_item(&app, &token, "Bad", "memes", &[]).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn replacement_image_retires_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = create_item(&app, &token, "Old car", "cars", &[]).await;
        let id = res.body["id"].as_i64().unwrap();
        let old_id = res.body["image"]["public_id"].as_str().unwrap().to_string();

        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::gallery_item(id),
                &[("title", "New car")],
                &[("image", "fresh.png")],
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"].as_str().unwrap(), "New car");
        assert!(!app.store.contains(&old_id));
        assert_eq!(app.store.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_record_first() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = create_item(&app, &token, "Going away", "events", &[]).await;
        let id = res.body["id"].as_i64().unwrap();

        let res = app
            .delete_with_token(&routes::gallery_item(id), &token)
            .await;
        assert_eq!(res.status, 204);
        assert!(app.store.is_empty());
    }
}

mod gallery_listing {
    use super::*;

    #[tokio::test]
    async fn filters_and_pagination_combine() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        for i in 0..3 {
            let title = format!("Car {i}");
            let res = create_item(&app, &token, &title, "cars", &[]).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }
        let res = create_item(
            &app,
            &token,
            "Trophy",
            "competitions",
            &[("is_highlighted", "true"), ("priority", "5")],
        )
        .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .get_without_token(&format!("{}?category=cars", routes::GALLERY))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total_items"].as_u64().unwrap(), 3);

        let res = app
            .get_without_token(&format!("{}?is_highlighted=true", routes::GALLERY))
            .await;
        assert_eq!(res.body["pagination"]["total_items"].as_u64().unwrap(), 1);
        assert_eq!(res.body["items"][0]["title"].as_str().unwrap(), "Trophy");

        let res = app
            .get_without_token(&format!("{}?per_page=2&page=2", routes::GALLERY))
            .await;
        assert_eq!(res.body["items"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["total_pages"].as_u64().unwrap(), 2);
    }

    #[tokio::test]
    async fn higher_priority_sorts_first() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        create_item(&app, &token, "Background", "events", &[("priority", "0")]).await;
        create_item(&app, &token, "Headline", "events", &[("priority", "10")]).await;

        let res = app.get_without_token(routes::GALLERY).await;
        assert_eq!(res.body["items"][0]["title"].as_str().unwrap(), "Headline");
    }
}
