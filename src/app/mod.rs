pub mod bootstrap;

pub use bootstrap::{build_sinks, build_sinks_with, load_startup_config, run, run_once};
