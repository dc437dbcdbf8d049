use serde::Deserialize;
use std::fs;

pub const DEFAULT_PRICE_SELECTORS: [&str; 6] = [
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    "span.a-price-whole",
    "span.a-offscreen",
    "span.a-price",
    "span.a-size-medium.a-color-price",
];

const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_browser_path")]
    pub browser_path: String,
    #[serde(default = "default_render_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            browser_path: default_browser_path(),
            timeout_seconds: default_render_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub tracked_urls: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    #[serde(default = "default_price_selectors")]
    pub price_selectors: Vec<String>,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub forecast_horizon_hours: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            check_interval_seconds: default_check_interval(),
            tracked_urls: Vec::new(),
            request_timeout_seconds: default_request_timeout(),
            user_agents: default_user_agents(),
            price_selectors: default_price_selectors(),
            render: RenderConfig::default(),
            forecast_horizon_hours: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_browser_path() -> String {
    "chromium".into()
}

fn default_render_timeout() -> u64 {
    30
}

fn default_db_path() -> String {
    "prices.db".into()
}

fn default_check_interval() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    20
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

fn default_price_selectors() -> Vec<String> {
    DEFAULT_PRICE_SELECTORS.iter().map(|s| s.to_string()).collect()
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
