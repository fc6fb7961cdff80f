// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_thinking_budget: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let gemini_api_key = env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");

        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        Url::parse(&gemini_base_url).expect("GEMINI_BASE_URL must be a valid URL");

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-3-pro-preview".to_string());

        let gemini_thinking_budget = env::var("GEMINI_THINKING_BUDGET")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(32768);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            gemini_api_key,
            gemini_base_url,
            gemini_model,
            gemini_thinking_budget,
            rust_log,
        }
    }
}
