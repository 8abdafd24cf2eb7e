use std::env;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub websocket_url: String,
    /// Upper bound on the whole connect + subscribe handshake.
    pub handshake_timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            websocket_url: env::var("WEBSOCKET_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8080/ws".to_string()),
            handshake_timeout_secs: env::var("HANDSHAKE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
