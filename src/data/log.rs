use ::log::LevelFilter;

/// 0 = warnings and errors, 1 = info, 2 = debug, 3+ = trace.
/// `RUST_LOG` takes precedence when set.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
