//! Logging and tracing utilities

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"`) applies.
/// Logs go to stderr so stdout carries only command output.
pub fn init_tracing(default_level: &str) {
    subscriber(default_level, std::io::stderr).init();
}

fn subscriber<W>(default_level: &str, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
}
