// ABOUTME: Integration tests for the REST API endpoints
// ABOUTME: Tests complete request/response flows, basic auth, permission checks and error bodies

#[cfg(test)]
mod tests {
    use crate::AppState;
    use crate::bootstrap;
    use crate::crypto::CredentialCodec;
    use crate::routes::build_router;
    use crate::storage::Storage;
    use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
    use axum_test::{TestRequest, TestServer};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;

    const ADMIN_PASSWORD: &str = "Adm1n-Password";

    async fn create_test_app() -> (TestServer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("api.db").display());

        let codec = CredentialCodec::new("integration-test-secret").unwrap();
        let storage = Arc::new(Storage::connect(&db_url, codec).await.unwrap());
        bootstrap::seed(&storage, ADMIN_PASSWORD).await.unwrap();

        let app = build_router(AppState { storage }, None);
        (TestServer::new(app).unwrap(), temp_dir)
    }

    fn basic(username: &str, password: &str) -> HeaderValue {
        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap()
    }

    fn as_admin(request: TestRequest) -> TestRequest {
        request.add_header(header::AUTHORIZATION, basic("admin", ADMIN_PASSWORD))
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (server, _temp_dir) = create_test_app().await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn test_endpoints_require_auth() {
        let (server, _temp_dir) = create_test_app().await;

        let response = server.get("/groups").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response
            .header(header::WWW_AUTHENTICATE)
            .to_str()
            .unwrap()
            .starts_with("Basic"));

        let wrong_password = server
            .get("/groups")
            .add_header(header::AUTHORIZATION, basic("admin", "Wr0ng-Password"))
            .await;
        let unknown_user = server
            .get("/groups")
            .add_header(header::AUTHORIZATION, basic("mallory", ADMIN_PASSWORD))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_user.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_user.text());
    }

    #[tokio::test]
    async fn test_me_lists_groups_and_functions() {
        let (server, _temp_dir) = create_test_app().await;

        let response = as_admin(server.get("/me")).await;
        response.assert_status_ok();

        let me: Value = response.json();
        assert_eq!(me["name"], "admin");
        assert_eq!(me["groups"][0]["description"], "admin");
        assert_eq!(me["functions"].as_array().unwrap().len(), 18);
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_seeded_types_are_listed() {
        let (server, _temp_dir) = create_test_app().await;

        let response = as_admin(server.get("/connection_types")).await;
        response.assert_status_ok();

        let body: Value = response.json();
        let names: Vec<_> = body["connection_type"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["description"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["SSH", "RDP", "SFTP", "FTP"]);

        let duplicate = as_admin(server.post("/connection_types"))
            .json(&json!({"description": "SSH"}))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.json::<Value>()["status"], 400);
    }

    #[tokio::test]
    async fn test_server_crud_flow() {
        let (server, _temp_dir) = create_test_app().await;

        let created = as_admin(server.post("/servers"))
            .json(&json!({
                "description": "web-1",
                "host": "10.0.0.1",
                "port": 22,
                "server_type_id": 1,
                "connection_type_id": 1,
            }))
            .await;
        created.assert_status_ok();
        let id = created.json::<Value>()["id"].as_i64().unwrap();

        let updated = as_admin(server.put(&format!("/servers/{}", id)))
            .json(&json!({"host": "10.0.0.2"}))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["host"], "10.0.0.2");

        let immutable = as_admin(server.put(&format!("/servers/{}", id)))
            .json(&json!({"server_type_id": 2}))
            .await;
        immutable.assert_status(StatusCode::BAD_REQUEST);

        let deleted = as_admin(server.delete(&format!("/servers/{}", id))).await;
        deleted.assert_status_ok();
        assert_eq!(deleted.json::<Value>()["success"], format!("{} deleted", id));

        let gone = as_admin(server.get(&format!("/servers/{}", id))).await;
        gone.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_errors_map_to_bad_request() {
        let (server, _temp_dir) = create_test_app().await;

        let missing = as_admin(server.post("/databases"))
            .json(&json!({"description": "orders"}))
            .await;
        missing.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = missing.json();
        assert_eq!(body["required_fields"], json!(["host", "port", "sid", "database_type_id"]));

        let dangling = as_admin(server.post("/databases"))
            .json(&json!({
                "description": "orders",
                "host": "db",
                "port": 1521,
                "sid": "ORCL",
                "database_type_id": 999,
            }))
            .await;
        dangling.assert_status(StatusCode::BAD_REQUEST);

        let weak = as_admin(server.post("/users"))
            .json(&json!({"name": "bob", "password": "bob"}))
            .await;
        weak.assert_status(StatusCode::BAD_REQUEST);

        let not_json = as_admin(server.post("/groups"))
            .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .text("{not json")
            .await;
        not_json.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_without_grants_is_forbidden() {
        let (server, _temp_dir) = create_test_app().await;

        as_admin(server.post("/users"))
            .json(&json!({"name": "bob", "password": "B0b-Password"}))
            .await
            .assert_status_ok();

        let bob = basic("bob", "B0b-Password");

        // Reads only need a valid principal
        server
            .get("/groups")
            .add_header(header::AUTHORIZATION, bob.clone())
            .await
            .assert_status_ok();

        let create = server
            .post("/groups")
            .add_header(header::AUTHORIZATION, bob.clone())
            .json(&json!({"description": "rogue"}))
            .await;
        create.assert_status(StatusCode::FORBIDDEN);

        let delete = server
            .delete("/groups/1")
            .add_header(header::AUTHORIZATION, bob)
            .await;
        delete.assert_status(StatusCode::FORBIDDEN);

        // Nothing was written or removed
        let groups: Value = as_admin(server.get("/groups")).await.json();
        assert_eq!(groups["groups"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_links_expand_and_reject_duplicates() {
        let (server, _temp_dir) = create_test_app().await;

        let group: Value = as_admin(server.post("/groups"))
            .json(&json!({"description": "ops"}))
            .await
            .json();
        let user: Value = as_admin(server.post("/users"))
            .json(&json!({"name": "bob", "password": "B0b-Password"}))
            .await
            .json();

        let link = as_admin(server.post("/user_groups"))
            .json(&json!({"group_id": group["id"], "user_id": user["id"]}))
            .await;
        link.assert_status_ok();
        let link: Value = link.json();
        assert_eq!(link["group"]["description"], "ops");
        assert_eq!(link["user"]["name"], "bob");

        let duplicate = as_admin(server.post("/user_groups"))
            .json(&json!({"group_id": group["id"], "user_id": user["id"]}))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);

        let missing_side = as_admin(server.post("/user_groups"))
            .json(&json!({"group_id": 999, "user_id": user["id"]}))
            .await;
        missing_side.assert_status(StatusCode::NOT_FOUND);

        // Orphaned after the group goes away
        as_admin(server.delete(&format!("/groups/{}", group["id"])))
            .await
            .assert_status_ok();

        let listed: Value = as_admin(server.get("/user_groups")).await.json();
        let orphan = listed["user_group"]
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["id"] == link["id"])
            .cloned()
            .unwrap();
        assert!(orphan["group"].is_null());

        let single = as_admin(server.get(&format!("/user_groups/{}", link["id"]))).await;
        single.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_credentials_are_returned_decrypted() {
        let (server, _temp_dir) = create_test_app().await;

        let created = as_admin(server.post("/logins"))
            .json(&json!({"user": "svc", "password": "p@ss", "connection_type_id": 1}))
            .await;
        created.assert_status_ok();
        let login: Value = created.json();
        assert_eq!(login["password"], "p@ss");

        let fetched: Value = as_admin(server.get(&format!("/logins/{}", login["id"])))
            .await
            .json();
        assert_eq!(fetched["password"], "p@ss");
        assert_eq!(fetched["connection_type_id"], 1);
    }

    #[tokio::test]
    async fn test_login_reads_need_a_grant() {
        let (server, _temp_dir) = create_test_app().await;

        let login: Value = as_admin(server.post("/logins"))
            .json(&json!({"user": "svc", "password": "prod-db-secret"}))
            .await
            .json();
        let server_row: Value = as_admin(server.post("/servers"))
            .json(&json!({
                "description": "web-1",
                "host": "10.0.0.1",
                "port": 22,
                "server_type_id": 1,
                "connection_type_id": 1,
            }))
            .await
            .json();
        as_admin(server.post("/connection_logins"))
            .json(&json!({"login_id": login["id"], "connection_id": server_row["id"]}))
            .await
            .assert_status_ok();
        as_admin(server.post("/users"))
            .json(&json!({"name": "intern", "password": "Int3rn-Password"}))
            .await
            .assert_status_ok();

        let intern = basic("intern", "Int3rn-Password");
        for path in [
            "/logins".to_string(),
            format!("/logins/{}", login["id"]),
            "/connection_logins".to_string(),
            "/connection_logins/1".to_string(),
        ] {
            let response = server
                .get(&path)
                .add_header(header::AUTHORIZATION, intern.clone())
                .await;
            response.assert_status(StatusCode::FORBIDDEN);
            assert!(!response.text().contains("prod-db-secret"));
        }

        // Other tables stay readable
        server
            .get("/servers")
            .add_header(header::AUTHORIZATION, intern)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_options_advertise_methods() {
        let (server, _temp_dir) = create_test_app().await;

        let collection = server.method(Method::OPTIONS, "/groups").await;
        collection.assert_status_ok();
        assert_eq!(
            collection.json::<Value>()["Allow"],
            json!(["GET", "POST", "OPTIONS"])
        );

        let item = server.method(Method::OPTIONS, "/groups/1").await;
        item.assert_status_ok();
        assert_eq!(item.json::<Value>()["Allow"], json!(["GET", "PUT", "DELETE", "OPTIONS"]));
        assert_eq!(item.header(header::ALLOW), "GET, PUT, DELETE, OPTIONS");

        let fixed = server.method(Method::OPTIONS, "/server_types/1").await;
        assert_eq!(fixed.header(header::ALLOW), "GET, DELETE, OPTIONS");

        // Type records cannot be updated
        let put = as_admin(server.put("/server_types/1"))
            .json(&json!({"description": "BSD"}))
            .await;
        put.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_responses_are_not_cacheable() {
        let (server, _temp_dir) = create_test_app().await;

        let response = as_admin(server.get("/logins")).await;
        response.assert_status_ok();
        assert_eq!(response.header(header::CACHE_CONTROL), "no-store");
        assert_eq!(
            response.header(HeaderName::from_static("x-content-type-options")),
            "nosniff"
        );
    }
}
