//! # API Client Tests
//!
//! Exercises the backend client against a mock HTTP server: request shape,
//! bearer authentication and mapping of failures to error kinds.

use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use novda_bot::api_client::ApiClient;
use novda_bot::api_errors::ApiError;
use novda_bot::models::{PlantingRecord, RegistrationForm};

fn registration_form() -> RegistrationForm {
    RegistrationForm {
        username: "alice".to_string(),
        password: "pa55word".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Smith".to_string(),
        phone_number: "+998901234567".to_string(),
        region: "Tashkent".to_string(),
        birth_date: "1990-05-01".to_string(),
    }
}

#[tokio::test]
async fn test_login_posts_form_and_returns_tokens() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": "acc", "refresh": "ref" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let tokens = api.login("alice", "secret").await?;
    assert_eq!(tokens.access, "acc");
    assert_eq!(tokens.refresh.as_deref(), Some("ref"));
    Ok(())
}

#[tokio::test]
async fn test_login_rejection_is_a_status_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let err = api.login("alice", "wrong").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 401,
            body: "bad credentials".to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_login_without_access_token_is_a_decode_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "detail": "ok" })))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    assert!(matches!(
        api.login("alice", "secret").await,
        Err(ApiError::Decode(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() -> Result<()> {
    let api = ApiClient::new("http://127.0.0.1:1");
    assert!(matches!(api.products().await, Err(ApiError::Network(_))));
    Ok(())
}

#[tokio::test]
async fn test_products_are_decoded() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "price": "10.00", "tree": { "name_en": "Oak", "desc_en": "Strong" } },
            { "id": 2, "price": 25 }
        ])))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let products = api.products().await?;
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].tree.name_en, "Oak");
    assert_eq!(products[1].tree.name_en, "Tree");
    assert_eq!(products[1].price.amount(), 25.0);
    Ok(())
}

#[tokio::test]
async fn test_register_sends_all_fields_with_empty_email() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .and(body_string_contains("FirstName=Alice"))
        .and(body_string_contains("birthDate=1990-05-01"))
        .and(body_string_contains("email="))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "access": "new-token" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let tokens = api.register(&registration_form()).await?;
    assert_eq!(tokens.access, "new-token");
    Ok(())
}

#[tokio::test]
async fn test_register_validation_error_is_relayed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Username already exists" })),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let err = api.register(&registration_form()).await.unwrap_err();
    assert_eq!(err.user_detail(), Some("Username already exists"));
    Ok(())
}

#[tokio::test]
async fn test_register_validation_payload_without_error_member() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "phoneNumber": ["invalid"] })),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let err = api.register(&registration_form()).await.unwrap_err();
    assert_eq!(err, ApiError::Rejected(r#"{"phoneNumber":["invalid"]}"#.to_string()));
    Ok(())
}

#[tokio::test]
async fn test_register_server_error_has_no_user_detail() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let err = api.register(&registration_form()).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.user_detail(), None);
    Ok(())
}

#[tokio::test]
async fn test_add_to_cart_is_bearer_authenticated() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/addToCart/"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({ "product_id": 42, "count": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let response = api.add_to_cart("tok", 42, 1).await?;
    assert_eq!(response["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_checkout_accepts_empty_body() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/checkout/"))
        .and(body_json(json!({ "payment_method": "payme" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    assert_eq!(api.checkout("tok", "payme").await?, serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_cart_mutations() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/update/cart/"))
        .and(body_json(json!({ "bucket_id": 9, "delta": -1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/remove/cart/"))
        .and(body_json(json!({ "bucket_id": 9 })))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    api.update_cart_quantity("tok", 9, -1).await?;
    assert!(matches!(
        api.remove_from_cart("tok", 9).await,
        Err(ApiError::Status { status: 404, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_plant_tree_sends_multipart_record() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/plant/tree/"))
        .and(header("authorization", "Bearer worker"))
        .and(body_string_contains("name=\"bucket\""))
        .and(body_string_contains("B-17"))
        .and(body_string_contains("name=\"longitude\""))
        .and(body_string_contains("69.24"))
        .and(body_string_contains("2026-10-19T08:30:00.000000"))
        .and(body_string_contains("filename=\"planted.jpg\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 5 })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let record = PlantingRecord {
        bucket: "B-17".to_string(),
        latitude: 41.31,
        longitude: 69.24,
        photo: b"jpeg-bytes".to_vec(),
    };
    let response = api
        .plant_tree("worker", record, "2026-10-19T08:30:00.000000")
        .await?;
    assert_eq!(response["id"], 5);
    Ok(())
}

#[tokio::test]
async fn test_profile_and_logout() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get/me/"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Alice",
            "phoneNumber": "+998",
            "region": "Samarkand"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout/"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(205))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri());
    let profile = api.profile("tok").await?;
    assert_eq!(profile.name, "Alice");
    assert_eq!(profile.region, "Samarkand");
    api.logout("tok").await?;
    Ok(())
}
