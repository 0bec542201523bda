//! Tracing setup for applications embedding `chart-viewport`.
//!
//! The pipeline itself only emits `tracing` events. Hosts either install
//! their own subscriber or call [`init_tracing`] once at startup.

/// Subscriber options used by [`init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Prints event targets (`chart_viewport::core::windowing`, ...).
    pub with_target: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            default_filter: "chart_viewport=info".to_owned(),
            with_target: false,
        }
    }
}

/// Installs a compact `fmt` subscriber when the `telemetry` feature is enabled.
///
/// Returns `false` when the feature is disabled or when the host already set a
/// global subscriber.
#[must_use]
pub fn init_tracing(options: &TracingOptions) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&options.default_filter));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(options.with_target)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = options;
        false
    }
}

/// Shorthand for [`init_tracing`] with [`TracingOptions::default`].
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(&TracingOptions::default())
}
