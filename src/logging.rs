use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive, e.g. `transcript_qa=debug`.
pub const LOG_ENV_VAR: &str = "TRANSCRIPT_QA_LOG";

/// Initialize structured JSON logging at the default `error` level.
pub fn init() {
    init_with_default(LevelFilter::ERROR);
}

/// Initialize structured JSON logging on stderr.
///
/// Design notes:
/// - stdout carries the answer, so log lines never go there.
/// - `TRANSCRIPT_QA_LOG` always wins over `default_level`; the default only applies when the
///   variable is unset or unparsable.
/// - Every event carries the current `answer` span, so its `request_id` ties one query's
///   events together.
/// - Calling this more than once is harmless; later calls are ignored.
pub fn init_with_default(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

/// Map a repeated `-v` count to a default level: none is `error`, then `warn`, `info`, `debug`,
/// and `trace` from four upward.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
