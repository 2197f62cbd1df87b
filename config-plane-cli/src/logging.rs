use tracing_subscriber::EnvFilter;

/// Install `color-eyre`'s panic/error reporting and a `tracing` subscriber
/// that defaults to `info` but honors `RUST_LOG`.
pub fn install() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    Ok(())
}
