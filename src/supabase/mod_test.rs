use super::*;

use crate::config::{SupabaseConfig, Timeouts};

#[test]
fn error_body_prefers_gotrue_msg() {
    let err = parse_error_body(400, r#"{"code":400,"msg":"Invalid login credentials"}"#);
    assert_eq!(err, BackendError::with_status(400, "Invalid login credentials"));
}

#[test]
fn error_body_reads_error_description() {
    let err = parse_error_body(400, r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#);
    assert_eq!(err.message, "Email not confirmed");
}

#[test]
fn error_body_reads_postgrest_message() {
    let err = parse_error_body(403, r#"{"code":"42501","message":"permission denied for table perfil_usuario"}"#);
    assert_eq!(err.message, "permission denied for table perfil_usuario");
    assert_eq!(err.status, Some(403));
}

#[test]
fn error_body_falls_back_to_error_string() {
    let err = parse_error_body(401, r#"{"error":"unauthorized"}"#);
    assert_eq!(err.message, "unauthorized");
}

#[test]
fn error_body_falls_back_to_raw_text() {
    assert_eq!(parse_error_body(502, "Bad Gateway").message, "Bad Gateway");
    assert_eq!(parse_error_body(500, "  ").message, "HTTP 500");
}

#[test]
fn request_carries_project_key() {
    let config = SupabaseConfig::new(
        "https://abc.supabase.co".into(),
        "anon-key".into(),
        "http://localhost:5173".into(),
        Timeouts::default(),
    )
    .unwrap();
    let client = SupabaseClient::new(&config).unwrap();

    let request = client.request(reqwest::Method::GET, "/auth/v1/user", Some("user-token")).build().unwrap();
    assert_eq!(request.url().as_str(), "https://abc.supabase.co/auth/v1/user");
    assert_eq!(request.headers()["apikey"], "anon-key");
    assert_eq!(request.headers()["Authorization"], "Bearer user-token");

    let anon = client.request(reqwest::Method::GET, "/rest/v1/perfil_usuario", None).build().unwrap();
    assert_eq!(anon.headers()["Authorization"], "Bearer anon-key");
}
