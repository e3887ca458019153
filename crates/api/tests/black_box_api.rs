use chrono::{Duration as ChronoDuration, Utc};
use ebm_auth::JwtClaims;
use ebm_infra::{AppConfig, Registry};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over fresh in-memory stores, on an ephemeral port.
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some(SECRET.to_string()),
            "BOOTSTRAP_ADMIN_LOGIN" => Some("admin".to_string()),
            "BOOTSTRAP_ADMIN_PASSWORD" => Some("admin123".to_string()),
            _ => None,
        })
        .expect("valid test config");
        let app = ebm_api::app::build_app(&config, Registry::in_memory());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, login: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn admin_token(&self) -> String {
        let res = self.login("admin", "admin123").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    /// POSTs and returns the id of the created record.
    async fn create(&self, token: &str, path: &str, body: Value) -> i64 {
        let res = self.post(token, path, body).await;
        let status = res.status();
        if status != StatusCode::CREATED {
            let body = res.text().await.unwrap_or_default();
            panic!("expected 201 from POST {path}, got {status} body={body}");
        }
        let created: Value = res.json().await.unwrap();
        created["id"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: &str, authorities: &[&str]) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: sub.to_string(),
        user_id: None,
        authorities: authorities.iter().map(|a| a.to_string()).collect(),
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn individual(name: &str, cpf: &str, email: &str) -> Value {
    json!({
        "name": name,
        "kind": "individual",
        "cpf": cpf,
        "emails": [{ "email": email, "kind": "Pessoal" }],
        "phones": [{ "ddd": "62", "number": "999990000", "kind": "Celular" }],
        "addresses": [{
            "street": "Rua 1",
            "neighborhood": "Centro",
            "number": "10",
            "cep": "74000000",
            "kind": "Residencial",
            "city": { "name": "Goiânia", "state": { "uf": "GO", "name": "Goiás" } }
        }]
    })
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.get("not-a-jwt", "/states").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("maria", &["STATE_GET"]);

    let res = srv.get(&token, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["login"], "maria");
    assert!(body["authorities"].as_array().unwrap().iter().any(|a| a == "STATE_GET"));
}

#[tokio::test]
async fn route_authority_is_enforced() {
    let srv = TestServer::spawn().await;
    let reader = mint_jwt("maria", &["STATE_GET"]);

    let res = srv.get(&reader, "/states").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.post(&reader, "/states", json!({ "uf": "GO", "name": "Goiás" })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = srv.get(&reader, "/cities?uf=GO").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.login("admin", "nope").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.login("ghost", "whatever").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn state_lifecycle_and_status_codes() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;

    let res = srv.post(&token, "/states", json!({ "uf": "go", "name": "Goiás" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();
    assert_eq!(location, format!("/states/{id}"));

    let res = srv.get(&token, "/states/uf/GO").await;
    assert_eq!(res.status(), StatusCode::OK);
    let state: Value = res.json().await.unwrap();
    assert_eq!(state["uf"], "GO");

    assert_eq!(srv.get(&token, "/states/abc").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.get(&token, "/states/999").await.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .delete(srv.url(&format!("/states/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get(&token, "/states/uf/GO").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_person_yields_field_errors() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;

    let res = srv
        .post(&token, "/people", json!({ "name": "Al", "kind": "individual", "cpf": "98765432100" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"emails"));

    let res = srv
        .post(&token, "/people", individual("Ana Lima", "12345678900", "ana@example.com"))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "data_integrity");
}

#[tokio::test]
async fn people_paging_and_document_lookup() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;

    srv.create(&token, "/people", individual("Carla Dias", "11144477735", "carla@example.com"))
        .await;
    let ana = srv
        .create(&token, "/people", individual("Ana Lima", "98765432100", "ana@example.com"))
        .await;

    let res = srv.get(&token, "/people/document?value=987.654.321-00").await;
    assert_eq!(res.status(), StatusCode::OK);
    let person: Value = res.json().await.unwrap();
    assert_eq!(person["id"], ana);
    assert_eq!(person["emails"][0]["principal"], true);

    let res = srv.get(&token, "/people/page?lines_per_page=1&direction=DESC").await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_elements"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["content"][0]["name"], "Carla Dias");

    let res = srv.get(&token, "/people/page?order_by=shoe_size").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get(&token, &format!("/addresses?person_id={ana}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let addresses: Value = res.json().await.unwrap();
    assert_eq!(addresses[0]["city"]["name"], "Goiânia");
}

#[tokio::test]
async fn user_created_through_the_api_can_log_in() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let person = srv
        .create(&admin, "/people", individual("Ana Lima", "98765432100", "ana@example.com"))
        .await;
    let role = srv
        .create(&admin, "/job-roles", json!({ "name": "Vendedor", "base_salary": 250000 }))
        .await;
    let employee = srv
        .create(
            &admin,
            "/employees",
            json!({ "person_id": person, "job_role_id": role, "hired_on": "2024-01-10", "commission_rate": 5 }),
        )
        .await;
    let user = srv
        .create(
            &admin,
            "/users",
            json!({ "login": "ana", "password": "s3nha", "permissions": ["PERSON_GET"], "employee_id": employee }),
        )
        .await;

    let res = srv.get(&admin, &format!("/users/{user}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["login"], "ana");
    assert!(body.get("password_hash").is_none());

    let res = srv.login("ana", "s3nha").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["authorities"], json!(["PERSON_GET"]));

    assert_eq!(srv.get(&token, &format!("/people/{person}")).await.status(), StatusCode::OK);
    assert_eq!(srv.get(&token, "/users/page").await.status(), StatusCode::FORBIDDEN);

    // The person is referenced by an employee.
    let res = srv
        .client
        .delete(srv.url(&format!("/people/{person}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get(&admin, "/users/page?email=example.com").await;
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["content"][0]["email"], "ana@example.com");
}

#[tokio::test]
async fn suppliers_by_category() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let drinks = srv.create(&admin, "/categories", json!({ "name": "Bebidas" })).await;
    let tools = srv.create(&admin, "/categories", json!({ "name": "Ferramentas" })).await;
    let company = srv
        .create(
            &admin,
            "/people",
            json!({
                "name": "Distribuidora Sul",
                "kind": "company",
                "cnpj": "11.222.333/0001-81",
                "legal_name": "Distribuidora Sul Ltda",
                "emails": [{ "email": "contato@sul.com" }],
                "phones": [{ "ddd": "62", "number": "32320000" }],
                "addresses": [{
                    "street": "Av. Goiás",
                    "neighborhood": "Centro",
                    "cep": "74000000",
                    "city": { "name": "Goiânia", "state": { "uf": "GO", "name": "Goiás" } }
                }]
            }),
        )
        .await;
    srv.create(&admin, "/suppliers", json!({ "person_id": company, "category_ids": [drinks] }))
        .await;

    let page: Value = srv
        .get(&admin, &format!("/suppliers/page?categories={drinks}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["person"]["legal_name"], "Distribuidora Sul Ltda");

    let page: Value = srv
        .get(&admin, &format!("/suppliers/page?categories={tools}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["total_elements"], 0);

    let res = srv
        .client
        .delete(srv.url(&format!("/categories/{drinks}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
