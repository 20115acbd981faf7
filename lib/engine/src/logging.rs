use hive_graphql_engine_config::log::{LogFormat, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::UtcTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Builds the output layer for the configured format.
pub fn output_layer<S>(format: LogFormat) -> BoxedLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::PrettyTree => tracing_tree::HierarchicalLayer::new(2)
            .with_indent_lines(true)
            .with_bracketed_fields(true)
            .with_timer(tracing_tree::time::Uptime::default())
            .with_targets(false)
            .boxed(),
        LogFormat::PrettyCompact => tracing_subscriber::fmt::layer()
            .compact()
            .with_timer(UtcTime::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_timer(UtcTime::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Fails when a global subscriber was already installed.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(output_layer(config.format))
        .with(EnvFilter::new(config.env_filter_str()))
        .try_init()
}
