use crate::config::types::{
    BackoffOptions, EntryType, FindOptions, RetryConfig, TransportConfig, DEFAULT_MAX_BODY_SIZE,
};
use crate::url::ensure_trailing_slash;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Prefix accepted in front of names that some servers render as `./name`
const DOT_SLASH_PREFIX: &str = r"^(\./)?";

/// Suffix accepted after directory names, rendered as `name/`
const OPTIONAL_SLASH_SUFFIX: &str = "/?$";

/// Validates the options and normalizes them in place
///
/// Normalization appends a trailing slash to every seed, defaults the entry
/// type to files, replaces a zero body limit with the default and sanitizes
/// the name pattern. Running it again on its own output changes nothing.
pub fn validate(options: &mut FindOptions) -> Result<(), ConfigError> {
    validate_seeds(&mut options.seeds)?;
    validate_name_pattern(&options.name_pattern)?;
    let entry_type = validate_entry_type(&mut options.entry_type)?;
    validate_retry_config(&options.retry)?;
    validate_transport_config(&options.transport)?;

    if options.max_body_size == 0 {
        options.max_body_size = DEFAULT_MAX_BODY_SIZE;
    }

    if options.crawl_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "crawl timeout must be greater than zero".to_string(),
        ));
    }

    options.name_pattern = sanitize_pattern(&options.name_pattern, entry_type);

    Ok(())
}

/// Validates seed URLs and makes each one end with a path separator
fn validate_seeds(seeds: &mut [String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation("no seed URLs specified".to_string()));
    }

    for seed in seeds.iter_mut() {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use the HTTP or HTTPS scheme",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }

        *seed = ensure_trailing_slash(seed);
    }

    Ok(())
}

fn validate_name_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "no file name regular expression specified".to_string(),
        ));
    }

    Regex::new(pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("error validating the file name expression: {}", e))
    })?;

    Ok(())
}

/// Parses the entry type, defaulting to files, and stores its canonical form
fn validate_entry_type(entry_type: &mut Option<String>) -> Result<EntryType, ConfigError> {
    let parsed = match entry_type.as_deref() {
        None | Some("") => EntryType::File,
        Some(value) => value.parse()?,
    };

    *entry_type = Some(parsed.as_str().to_string());
    Ok(parsed)
}

fn validate_retry_config(retry: &RetryConfig) -> Result<(), ConfigError> {
    let specs = [
        ("context-deadline", &retry.context_deadline),
        ("connection-timeout", &retry.connection_timeout),
        ("connection-reset", &retry.connection_reset),
    ];

    for (name, spec) in specs {
        if let Some(spec) = spec {
            validate_backoff(name, spec)?;
        }
    }

    Ok(())
}

fn validate_backoff(name: &str, options: &BackoffOptions) -> Result<(), ConfigError> {
    if options.initial_interval_ms == 0 {
        return Err(ConfigError::Validation(format!(
            "{} backoff: initial interval must be greater than zero",
            name
        )));
    }

    if options.max_interval_ms < options.initial_interval_ms {
        return Err(ConfigError::Validation(format!(
            "{} backoff: max interval ({}ms) is lower than initial interval ({}ms)",
            name, options.max_interval_ms, options.initial_interval_ms
        )));
    }

    Ok(())
}

fn validate_transport_config(transport: &TransportConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("connection-timeout", transport.connection_timeout_ms),
        ("tls-handshake-timeout", transport.tls_handshake_timeout_ms),
        ("idle-connection-timeout", transport.idle_connection_timeout_ms),
    ];

    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "transport {} must be greater than zero",
                name
            )));
        }
    }

    if transport.request_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "transport request-timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Rewrites a name pattern so that equivalent listing renderings match alike
///
/// A pattern anchored with `^` also accepts a leading `./`. For directories, a
/// pattern anchored with `$` also accepts a trailing `/`. Already sanitized
/// patterns are returned unchanged.
pub fn sanitize_pattern(pattern: &str, entry_type: EntryType) -> String {
    let mut sanitized = pattern.to_string();

    if sanitized.starts_with('^')
        && !sanitized.starts_with("^./")
        && !sanitized.starts_with(r"^\./")
        && !sanitized.starts_with(DOT_SLASH_PREFIX)
    {
        sanitized = sanitized.replacen('^', DOT_SLASH_PREFIX, 1);
    }

    if entry_type == EntryType::Directory
        && sanitized.ends_with('$')
        && !sanitized.ends_with(r"\$")
        && !sanitized.ends_with("/$")
        && !sanitized.ends_with(OPTIONAL_SLASH_SUFFIX)
    {
        sanitized.truncate(sanitized.len() - 1);
        sanitized.push_str(OPTIONAL_SLASH_SUFFIX);
    }

    sanitized
}
