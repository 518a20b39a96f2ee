//! Ambient configuration (§1, §6): attach target, the base-page-class binary
//! name used to filter class-prepare requests (§4.3), and the bounds used by
//! the worker bootstrap and step finalizer.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host the target VM's JDWP transport is listening on.
    pub host: String,
    /// Port the target VM's JDWP transport is listening on.
    pub port: u16,
    /// Binary (JNI-style) name of the dynamic language's base page class,
    /// e.g. `"cfx/runtime/CFPage"`. Only subclasses of this are tracked by
    /// the class registry (§4.3).
    pub base_page_class: String,
    /// How long the worker bootstrap (§4.2) will busy-wait for the helper
    /// thread's breakpoint acknowledgement before giving up.
    #[serde(with = "duration_millis")]
    pub worker_bootstrap_timeout: Duration,
    /// How long the stepping engine's phase-2 caller busy-waits on the
    /// finalization-complete flag (§4.5) before giving up.
    #[serde(with = "duration_millis")]
    pub step_finalize_timeout: Duration,
    /// JNI-style binary name of the worker bootstrap's designated helper
    /// class (§4.2).
    pub worker_class_binary_name: String,
    /// Name of the helper class's no-op method the bootstrap thread enters
    /// and is breakpointed in at code index 0 (§4.2).
    pub worker_noop_method_name: String,
    /// Name of the helper class's static thread-lookup method
    /// (`jdwp_getThread` in §4.2) used to translate a dwpThreadRef into a
    /// native thread handle.
    pub worker_thread_lookup_method_name: String,
    /// Method name the stepping engine's phase-2 finalizer looks for while
    /// walking frames to find the topmost language-level frame
    /// (`isStepNotificationEntryFunc` in §4.5).
    pub step_notification_entry_func_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            base_page_class: "cfx/runtime/CFPage".to_owned(),
            worker_bootstrap_timeout: Duration::from_secs(10),
            step_finalize_timeout: Duration::from_secs(2),
            worker_class_binary_name: "cfx/jdwp/Worker".to_owned(),
            worker_noop_method_name: "jdwp_noop".to_owned(),
            worker_thread_lookup_method_name: "jdwp_getThread".to_owned(),
            step_notification_entry_func_name: "jdwp_stepNotificationEntry".to_owned(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file. A missing file is an error —
    /// callers that want "no file means defaults" should check for existence
    /// themselves and fall back to [`Config::default`].
    pub fn load(path: &std::path::Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert!(config.worker_bootstrap_timeout > Duration::ZERO);
    }

    #[test]
    fn parses_a_well_formed_file() {
        let dir = std::env::temp_dir().join("cf-debug-core-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
            host = "10.0.0.5"
            port = 9009
            base_page_class = "cfx/runtime/CFPage"
            worker_bootstrap_timeout = 5000
            step_finalize_timeout = 500
            worker_class_binary_name = "cfx/jdwp/Worker"
            worker_noop_method_name = "jdwp_noop"
            worker_thread_lookup_method_name = "jdwp_getThread"
            step_notification_entry_func_name = "jdwp_stepNotificationEntry"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 9009);
    }

    #[test]
    fn malformed_file_is_a_config_error_not_a_panic() {
        let dir = std::env::temp_dir().join("cf-debug-core-config-test-bad");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
