use crate::config::types::{
    Config, CrawlerConfig, SeenStoreConfig, SiteConfig, StorageConfig, UserAgentConfig,
};
use crate::url::canonical_origin;
use crate::ConfigError;
use url::Url;

/// Largest batch the seen-URL store accepts in one delete request
const MAX_BATCH_SIZE: usize = 25;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_seen_store_config(&config.seen_store)?;
    validate_storage_config(&config.storage)?;
    validate_visibility_window(&config.crawler, &config.storage)?;
    Ok(())
}

/// Ensures a received message stays hidden for longer than one bounded call
fn validate_visibility_window(
    crawler: &CrawlerConfig,
    storage: &StorageConfig,
) -> Result<(), ConfigError> {
    if storage.visibility_timeout_seconds <= crawler.operation_timeout_seconds {
        return Err(ConfigError::Validation(format!(
            "visibility-timeout-seconds ({}) must exceed operation-timeout-seconds ({})",
            storage.visibility_timeout_seconds, crawler.operation_timeout_seconds
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // Validate politeness window
    for (name, value) in [
        ("min-sleep-seconds", config.min_sleep_seconds),
        ("sleep-delta-seconds", config.sleep_delta_seconds),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    // Validate operation timeout
    if config.operation_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "operation-timeout-seconds must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    // Validate contact email
    validate_email(&config.contact_email)
}

/// Validates the site origin and default seed
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    canonical_origin(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    // Seeds must be fetchable over HTTP
    let seed = Url::parse(&config.default_seed).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid default-seed '{}': {}", config.default_seed, e))
    })?;

    if !matches!(seed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "default-seed '{}' must use http or https",
            config.default_seed
        )));
    }

    Ok(())
}

/// Validates seen-store batching
fn validate_seen_store_config(config: &SeenStoreConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }
    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.visibility_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "visibility-timeout-seconds must be > 0".to_string(),
        ));
    }

    // Zero would dead-letter every message before its first delivery
    if config.max_receive_count == 0 {
        return Err(ConfigError::Validation(
            "max-receive-count must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}
