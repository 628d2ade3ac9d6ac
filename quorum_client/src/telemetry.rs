use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "quorum_client=info,quorum_media=info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`, or by
/// [`DEFAULT_FILTER`] when it is unset or unparsable. Only the first call
/// has an effect.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Same as [`init_tracing`] with a caller-chosen fallback filter, e.g.
/// `quorum_client=debug` to log every node request.
pub fn init_tracing_with(fallback: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing();
        init_tracing_with("quorum_client=debug");
        tracing::info!(filter = DEFAULT_FILTER, "tracing initialized twice");
    }
}
