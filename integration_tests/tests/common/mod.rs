use std::path::PathBuf;
use std::sync::Once;

use bevy::prelude::App;
use snatch_core::{build_sandbox_app, load_match_config_from_env, MatchConfig};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_match_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test match config at {}",
            config_path.display()
        );

        std::env::set_var("SNATCH_CONFIG_PATH", &config_path);
    });
}

pub fn test_config() -> MatchConfig {
    ensure_test_config();
    load_match_config_from_env()
}

pub fn test_app() -> App {
    build_sandbox_app(test_config())
}
