//! Logging setup: a tracing subscriber whose debug level can be toggled at
//! runtime (SIGUSR1).

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Context;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;

static RELOAD: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static DEBUG: AtomicBool = AtomicBool::new(false);

fn filter_for(debug: bool) -> EnvFilter {
    // RUST_LOG still wins over the computed default when set.
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }))
}

/// Installs the global subscriber, writing to stderr or to the given file.
pub fn init(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    DEBUG.store(debug, Ordering::SeqCst);
    let (filter, handle) = reload::Layer::new(filter_for(debug));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file `{}`", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        None => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    let _ = RELOAD.set(handle);
    Ok(())
}

pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::SeqCst);
    if let Some(handle) = RELOAD.get() {
        let _ = handle.reload(filter_for(debug));
    }
}

/// Flips the debug level and returns the new state.
pub fn toggle_debug() -> bool {
    let debug = !DEBUG.load(Ordering::SeqCst);
    set_debug(debug);
    debug
}
