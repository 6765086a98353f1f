//! Structured logging helpers
//!
//! Filter construction for the tracing subscriber and request ID generation
//! for the request monitor.

/// Build filter directives string from LoggingConfig
///
/// Component levels are appended in alphabetical order after the base level,
/// scoped to this crate's modules.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use ticketboard::config::{LogFormat, LoggingConfig};
/// use ticketboard::logging::build_filter_directives;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(HashMap::from([("client".to_string(), "debug".to_string())])),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,ticketboard::client=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",ticketboard::{}={}", component, level));
        }
    }

    filter_str
}

/// Generate a unique request ID (UUID v4)
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, LoggingConfig};
    use std::collections::HashMap;

    #[test]
    fn test_generate_request_id_is_uuid() {
        let id = generate_request_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_ne!(id, generate_request_id());
    }

    #[test]
    fn test_filter_directives_base_level_only() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            component_levels: None,
        };
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_directives_sorted_components() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: Some(HashMap::from([
                ("store".to_string(), "trace".to_string()),
                ("client".to_string(), "debug".to_string()),
            ])),
        };
        assert_eq!(
            build_filter_directives(&config),
            "info,ticketboard::client=debug,ticketboard::store=trace"
        );
    }
}
