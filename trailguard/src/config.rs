use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use tracing::*;
use trailguard_common::{TrailguardConfig, TrailguardConfigStore};

/// `TRAILGUARD_ABUSE_PROTECTION__MAX_REJECTIONS` overrides
/// `abuse_protection.max_rejections`
fn environment() -> Environment {
    Environment::with_prefix("TRAILGUARD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn load_config(path: &Path) -> Result<TrailguardConfig> {
    load_config_with(path, environment())
}

fn load_config_with(path: &Path, environment: Environment) -> Result<TrailguardConfig> {
    let store: TrailguardConfigStore = Config::builder()
        .add_source(File::from(path))
        .add_source(environment)
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    let config = TrailguardConfig {
        store,
        paths_relative_to: path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    config.validate().context("Invalid config")?;

    info!(
        "Using config: {path:?} (max rejections: {}, window: {:?}, history: {})",
        config.store.abuse_protection.max_rejections,
        config.store.abuse_protection.window,
        config.store.plausibility.history_len,
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use trailguard_common::BanExpiryPolicy;

    use super::*;

    fn load(path: &Path) -> Result<TrailguardConfig> {
        load_config_with(path, environment().source(Some(HashMap::new())))
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config_with_overrides() {
        let file = write_config(
            "abuse_protection:\n  max_rejections: 4\n  window: 2h\n  expiry_policy: plain\n",
        );
        let config = load(file.path()).unwrap();
        let abuse_protection = &config.store.abuse_protection;
        assert_eq!(abuse_protection.max_rejections, 4);
        assert_eq!(abuse_protection.window.as_secs(), 7200);
        assert_eq!(abuse_protection.expiry_policy, BanExpiryPolicy::Plain);
        assert_eq!(config.store.plausibility.history_len, 3);
        assert_eq!(Some(config.paths_relative_to.as_path()), file.path().parent());
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let file = write_config("plausibility:\n  history_len: 1\n");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides_use_single_underscore_prefix() {
        let file = write_config("abuse_protection:\n  max_rejections: 4\n");
        let variables = HashMap::from([
            (
                "TRAILGUARD_ABUSE_PROTECTION__MAX_REJECTIONS".to_owned(),
                "7".to_owned(),
            ),
            (
                "TRAILGUARD_PLAUSIBILITY__MAX_GROUND_SPEED_KMH".to_owned(),
                "120.5".to_owned(),
            ),
        ]);
        let config = load_config_with(file.path(), environment().source(Some(variables))).unwrap();
        assert_eq!(config.store.abuse_protection.max_rejections, 7);
        assert_eq!(config.store.plausibility.max_ground_speed_kmh, 120.5);
    }
}
