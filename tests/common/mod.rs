#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use match_gateway::prelude::*;

pub const TEST_SECRET: &str = "integration-test-secret-key";

/// Config with budgets generous enough that rate limiting never interferes
/// unless a test asks for it.
pub fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        max_body_bytes: 65_536,
        rate_login_window_secs: 60,
        rate_login_max: 1_000,
        rate_otp_window_secs: 60,
        rate_otp_max: 1_000,
        rate_api_window_secs: 60,
        rate_api_max: 1_000,
    }
}

pub fn test_server() -> TestServer {
    server_with(test_config())
}

pub fn server_with(config: Config) -> TestServer {
    let state = AppState::new(&config);
    TestServer::new(app_router(state)).unwrap()
}

pub fn mint_token(sub: &str, role: Role, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_owned(),
        email: format!("{sub}@example.com"),
        role,
        iat: now,
        exp: now + exp_offset_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(sub: &str) -> String {
    format!("Bearer {}", mint_token(sub, Role::Member, 3600))
}

pub fn admin_bearer(sub: &str) -> String {
    format!("Bearer {}", mint_token(sub, Role::Admin, 3600))
}
