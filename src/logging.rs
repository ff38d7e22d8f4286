use std::io::Write;

use log::LevelFilter;

use crate::config::ClientConfig;

/// Install the process logger. Safe to call more than once; later calls are ignored.
///
/// `RUST_LOG` takes precedence over the level derived from `config.debug`.
pub fn init(config: &ClientConfig) {
    let level = if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{}] {:<5} {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::info!(
            "=== warranty-portal v{} started (api: {}) ===",
            env!("CARGO_PKG_VERSION"),
            config.api_base_url
        );
    }
}
