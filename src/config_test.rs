use super::*;

use std::sync::{Mutex, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_supabase_env() {
    unsafe {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("SITE_URL");
        std::env::remove_var("SUPABASE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("SUPABASE_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_applies_defaults() {
    let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_supabase_env();
        std::env::set_var("SUPABASE_URL", "https://abc.supabase.co/");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
    }

    let cfg = SupabaseConfig::from_env().unwrap();
    assert_eq!(cfg.url, "https://abc.supabase.co");
    assert_eq!(cfg.anon_key, "anon");
    assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
    assert_eq!(cfg.timeouts, Timeouts::default());

    unsafe { clear_supabase_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_supabase_env();
        std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
        std::env::set_var("SITE_URL", "https://englishquest.example/");
        std::env::set_var("SUPABASE_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("SUPABASE_CONNECT_TIMEOUT_SECS", "2");
    }

    let cfg = SupabaseConfig::from_env().unwrap();
    assert_eq!(cfg.site_url, "https://englishquest.example");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });

    unsafe { clear_supabase_env() };
}

#[test]
fn from_env_missing_url_errors() {
    let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_supabase_env();
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
    }

    let err = SupabaseConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("SUPABASE_URL"));

    unsafe { clear_supabase_env() };
}

#[test]
fn new_rejects_schemeless_url() {
    let err = SupabaseConfig::new("abc.supabase.co".into(), "anon".into(), DEFAULT_SITE_URL.into(), Timeouts::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "SUPABASE_URL", .. }));
}

#[test]
fn new_rejects_blank_key() {
    let err = SupabaseConfig::new("https://abc.supabase.co".into(), "  ".into(), DEFAULT_SITE_URL.into(), Timeouts::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingVar("SUPABASE_ANON_KEY")));
}

#[test]
fn redirects_append_app_routes() {
    let redirects = Redirects::for_site("https://englishquest.example/");
    assert_eq!(redirects.email_confirmation, "https://englishquest.example/login");
    assert_eq!(redirects.password_reset, "https://englishquest.example/reset-password");
}
