//! `[LEVEL] message` console output, level coloured by severity.

use std::io::Write;

use env_logger::Env;

/// Installs the global logger. Filter defaults to `trace`; `RUST_LOG` overrides.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("trace"))
        .format(|buf, record| {
            let level = buf.default_styled_level(record.level());
            writeln!(buf, "[{level}] {}", record.args())
        })
        .init();
}
