use anyhow::Context;
use foodie_types::domain::paging::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::env;

/// 500KB, the storefront's upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 500 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub default_page_size: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let default_page_size = match env::var("DEFAULT_PAGE_SIZE") {
            Ok(v) => parse_positive(&v).context("DEFAULT_PAGE_SIZE must be a positive integer")?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };
        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(v) => v
                .trim()
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        Ok(Self {
            server_port,
            database_url,
            default_page_size,
            max_upload_bytes,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: "3000".into(),
            database_url: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn parse_positive(v: &str) -> anyhow::Result<u32> {
    let n: u32 = v.trim().parse()?;
    anyhow::ensure!(n > 0, "must be greater than zero");
    Ok(n)
}
