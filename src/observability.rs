//! Diagnostics for the codec: a one-time logger installer and a structured
//! metric macro.
//!
//! The codec itself only talks to the `log` facade. Embedders that already run
//! a logger get our records for free; everyone else can call
//! [`enable_verbose_logging`] once to see them.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::CodecError;

/// Logs a structured key-value metric string to stdout, only in debug builds.
///
/// # Example
/// ```
/// use adbc_column::log_metric;
/// let rows = 4;
/// log_metric!("event"="decode", "format"="+s", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            let output = format!("ADBC_COLUMN_METRIC: {{ {} }}", parts.join(", "));
            log::trace!("{}", output);
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at `Debug` level, printing `[LEVEL] message`.
///
/// When `log_file` is given, records are appended to that file instead of
/// stderr. Only the first call has any effect.
pub fn enable_verbose_logging(log_file: Option<String>) -> Result<(), CodecError> {
    let mut result = Ok(());
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => {
                    result = Err(CodecError::Io(e));
                    return;
                }
            }
        }

        let _ = builder.try_init();
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_verbose_logging_is_idempotent() {
        assert!(enable_verbose_logging(None).is_ok());
        // The second call is a no-op, even with a path that cannot be opened.
        assert!(enable_verbose_logging(Some("/nonexistent/dir/codec.log".into())).is_ok());
        log::debug!("logger installed");
    }

    #[test]
    fn test_log_metric_expands() {
        let rows = 3usize;
        log_metric!("event" = "unit_test", "rows" = &rows);
    }
}
