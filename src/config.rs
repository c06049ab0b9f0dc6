use anyhow::{Context, Result};

/// Server connection settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

fn required_var(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .with_context(|| format!("Environment variable {name} is not set (see .env)"))?;
    if value.trim().is_empty() {
        return Err(anyhow::anyhow!("Environment variable {name} is empty"));
    }
    Ok(value)
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // A missing .env is fine, the variables may be exported already
    dotenv::dotenv().ok();

    Ok(Config {
        base_url: required_var("BASE_URL")?,
        username: required_var("USERNAME")?,
        password: required_var("PASSWORD")?,
    })
}
