use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Fallback filter when `RUST_LOG` is unset. HTTP internals stay quiet.
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

/// Filter from `RUST_LOG`, read after `.env` is loaded so a value set only
/// there still applies.
pub fn env_filter() -> EnvFilter {
    crate::util::env::init_env();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global fmt subscriber shared by the service and the CLI.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(bin_name: &str) -> Result<(), anyhow::Error> {
    SubscriberBuilder::default()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing for {bin_name}: {e}"))?;

    tracing::debug!(bin = bin_name, "tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_honours_rust_log() {
        std::env::set_var("RUST_LOG", "warn,price_sheet_sync=trace");
        let filter = env_filter().to_string();
        std::env::remove_var("RUST_LOG");
        assert!(filter.contains("price_sheet_sync=trace"), "{filter}");
    }
}
