use std::sync::Once;

use dotenvy::dotenv;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Routes log output to stdout for tests: `info` for dependencies, `debug`
/// (generated SQL included) for this crate. `RUST_LOG`, from the environment
/// or `.env`, overrides both.
pub fn init_logging_for_tests() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::builder()
            .target(env_logger::Target::Stdout)
            .filter_level(LevelFilter::Info)
            .filter_module("rosterdiesel", LevelFilter::Debug)
            .parse_default_env()
            .is_test(true)
            .try_init();
    });
}
