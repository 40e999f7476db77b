//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    ApiConfig, BotConfig, LogOutput, LoggingConfig, ServerConfig, TunnelConfig, WebexBotConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &WebexBotConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_server_config(&config.server)?;
    validate_api_config(&config.api)?;
    validate_tunnel_config(&config.tunnel)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the bot identity.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.access_token.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.access_token"));
    }

    if bot.name.is_empty() {
        return Err(ConfigError::missing_field("bot.name"));
    }

    // The name is used verbatim as a URL path segment.
    if let Some(c) = bot
        .name
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ConfigError::validation(format!(
            "Bot name '{}' contains '{c}'; only ASCII letters, digits, '-', '_' and '.' are allowed",
            bot.name
        )));
    }

    Ok(())
}

/// Validates the webhook server settings.
fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.is_empty() {
        return Err(ConfigError::missing_field("server.host"));
    }
    validate_port(server.port)
}

/// Validates the REST client settings.
fn validate_api_config(api: &ApiConfig) -> ConfigResult<()> {
    validate_url(&api.base_url)?;
    if api.timeout_ms == 0 {
        return Err(ConfigError::validation("API timeout must be greater than 0"));
    }
    Ok(())
}

/// Validates the public URL, when one is set.
fn validate_tunnel_config(tunnel: &TunnelConfig) -> ConfigResult<()> {
    match &tunnel.public_url {
        Some(url) => validate_url(url),
        None => Ok(()),
    }
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates an HTTP(S) URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    let valid_schemes = ["http://", "https://"];
    let Some(rest) = valid_schemes.iter().find_map(|s| url.strip_prefix(s)) else {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    };

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::invalid_url(url, "URL has no host"));
    }

    Ok(())
}

/// Validates a port number.
fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> WebexBotConfig {
        let mut config = WebexBotConfig::default();
        config.bot.access_token = "token".to_string();
        config
    }

    #[test]
    fn test_validate_default_with_token() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_missing_token() {
        let result = validate_config(&WebexBotConfig::default());
        assert!(matches!(
            result,
            Err(ConfigError::MissingField { field }) if field == "bot.access_token"
        ));
    }

    #[test]
    fn test_validate_bot_name() {
        let mut config = valid();
        config.bot.name = "my bot".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.bot.name = "team/bot".to_string();
        assert!(validate_config(&config).is_err());

        config.bot.name = "team-bot_2".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_urls() {
        let mut config = valid();
        config.tunnel.public_url = Some("ftp://example.com".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        config.tunnel.public_url = Some("https://".to_string());
        assert!(validate_config(&config).is_err());

        config.tunnel.public_url = Some("https://abc.example".to_string());
        assert!(validate_config(&config).is_ok());

        config.api.base_url = "webexapis.com/v1".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_timeout_and_port() {
        let mut config = valid();
        config.api.timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("bot.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
