use tracing_subscriber::EnvFilter;

/// Filter directives for a `-v` count when `RUST_LOG` is not set.
fn filter_directives(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "warn,sandboxed_fs=info,sandbox=info,fs_explorer=info",
        1 => "info,sandboxed_fs=debug,sandbox=debug,fs_explorer=debug",
        _ => "debug,sandboxed_fs=trace,sandbox=trace,fs_explorer=trace",
    }
}

/// Installs the global subscriber. Everything goes to stderr since stdout
/// carries JSON-RPC.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter_directives(verbose_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
