use tracing::Level;

/// Install the global subscriber. Output goes to stderr; stdout carries the
/// report. `json` selects machine-readable lines, anything else plain text.
pub fn init_logging(log_format: &str, log_level: Level) {
    if log_format.eq_ignore_ascii_case("json") {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
