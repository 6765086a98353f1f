//! Fetch command implementation

use crate::cli::output;
use crate::cli::FetchArgs;
use crate::config::{DashboardConfig, LogFormat};
use crate::dashboard::{Dashboard, RefreshOutcome};
use crate::store::Action;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI args and env overrides
pub fn load_config_with_overrides(
    args: &FetchArgs,
) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        DashboardConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        DashboardConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref url) = args.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(retries) = args.retries {
        config.retry.max_retries = retries;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Initialize tracing based on configuration
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Bearer token from the command line, or from the env var named in config.
fn resolve_token(args: &FetchArgs, config: &DashboardConfig) -> Option<String> {
    args.token.clone().or_else(|| {
        config
            .api
            .token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
    })
}

/// Handle `ticketboard fetch` command
pub async fn run_fetch(args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    let prometheus = if args.metrics {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let dashboard = Dashboard::new(&config)?;
    if dashboard.restore_session()? {
        tracing::debug!("Using stored session token");
    }
    if let Some(token) = resolve_token(&args, &config) {
        dashboard.client().set_auth_token(token);
    }

    let filters = args.filters();
    if !filters.is_empty() {
        dashboard.store().dispatch(Action::SetFilters(filters));
    }

    tracing::info!(
        base_url = %config.api.base_url,
        endpoint = %config.api.metrics_endpoint,
        repeat = args.repeat,
        "Fetching dashboard metrics"
    );

    let mut outcome = RefreshOutcome::Superseded;
    for _ in 0..args.repeat.max(1) {
        outcome = dashboard.refresh_data().await;
    }

    let state = dashboard.store().state();
    let stats = dashboard.request_stats();
    if args.json {
        println!(
            "{}",
            output::format_state_json(&state, args.stats.then_some(&stats))?
        );
    } else {
        println!("{}", output::format_dashboard(&state));
        if args.stats {
            println!("{}", output::format_stats_table(&stats));
        }
    }
    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }

    dashboard.dispose();

    match outcome {
        RefreshOutcome::Failed { error } => Err(error.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn fetch_args(extra: &[&str]) -> FetchArgs {
        let mut argv = vec!["ticketboard", "fetch", "-c", "/nonexistent/ticketboard.toml"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Fetch(args) => args,
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let args = fetch_args(&[
            "-u",
            "http://glpi.example:9000/api",
            "--retries",
            "0",
            "--no-cache",
            "-l",
            "debug",
        ]);
        let config = load_config_with_overrides(&args).unwrap();
        assert_eq!(config.api.base_url, "http://glpi.example:9000/api");
        assert_eq!(config.retry.max_retries, 0);
        assert!(!config.cache.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = fetch_args(&["-u", "ftp://glpi.example"]);
        assert!(load_config_with_overrides(&args).is_err());
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticketboard.toml");
        std::fs::write(&path, "[cache]\nttl_seconds = 42\n").unwrap();

        let argv = ["ticketboard", "fetch", "-c", path.to_str().unwrap()];
        let args = match Cli::try_parse_from(argv).unwrap().command {
            Commands::Fetch(args) => args,
            _ => panic!("Expected Fetch command"),
        };
        let config = load_config_with_overrides(&args).unwrap();
        assert_eq!(config.cache.ttl_seconds, 42);
    }

    #[test]
    fn test_token_from_flag() {
        let args = fetch_args(&["--token", "abc"]);
        assert_eq!(
            resolve_token(&args, &DashboardConfig::default()).as_deref(),
            Some("abc")
        );
    }
}
