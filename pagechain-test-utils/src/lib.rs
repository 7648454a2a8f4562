use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber for test binaries. `RUST_LOG` overrides the
/// default `warn` filter. Safe to call from every test; only the first call
/// does anything, and a subscriber installed elsewhere wins quietly.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Runs at binary load so individual tests don't have to call init.
    #[ctor::ctor]
    fn init() {
        super::init_tracing();
    }
}
