use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use ticket_market_core::RawConfig;
use ticket_market_engine::Timing;

/// Name of the settings file searched for in the working directory and its
/// ancestors
pub const SETTINGS_FILE: &str = "market.toml";

/// Settings of a simulation run, from a file and/or the command line
#[derive(Clone, Copy, Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(flatten)]
    pub config: RawConfig,

    /// Wall-clock duration of the run
    pub run_secs: Option<u64>,

    pub release_delay_ms: Option<u64>,
    pub retrieval_delay_ms: Option<u64>,
    pub monitor_interval_ms: Option<u64>,
}

impl Settings {
    /// Load the settings from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("could not read {}", path.display()))?;
        toml::from_str(&contents).wrap_err_with(|| format!("could not parse {}", path.display()))
    }

    /// Find [`SETTINGS_FILE`] in the working directory or one of its
    /// ancestors and load it
    ///
    /// Returns the default settings if there is no such file.
    pub fn discover() -> Result<Self> {
        match find_upwards(std::env::current_dir()?)? {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading settings");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Overlay the values set in `other` on top of `self`
    pub fn merge(self, other: Settings) -> Settings {
        Settings {
            config: self.config.merge(other.config),
            run_secs: other.run_secs.or(self.run_secs),
            release_delay_ms: other.release_delay_ms.or(self.release_delay_ms),
            retrieval_delay_ms: other.retrieval_delay_ms.or(self.retrieval_delay_ms),
            monitor_interval_ms: other.monitor_interval_ms.or(self.monitor_interval_ms),
        }
    }

    /// Worker pacing, falling back to [`Timing::default()`]
    ///
    /// Rejects a monitor interval of 0.
    pub fn timing(&self) -> Result<Timing> {
        if self.monitor_interval_ms == Some(0) {
            return Err(eyre!("monitor-interval-ms must be at least 1"));
        }
        let default = Timing::default();
        Ok(Timing {
            release_delay: self
                .release_delay_ms
                .map_or(default.release_delay, Duration::from_millis),
            retrieval_delay: self
                .retrieval_delay_ms
                .map_or(default.retrieval_delay, Duration::from_millis),
            monitor_interval: self
                .monitor_interval_ms
                .map_or(default.monitor_interval, Duration::from_millis),
        })
    }
}

fn find_upwards(mut path: PathBuf) -> Result<Option<PathBuf>> {
    loop {
        path.push(SETTINGS_FILE);

        match std::fs::metadata(&path) {
            Ok(_) => return Ok(Some(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        path.pop();
        if !path.pop() {
            return Ok(None);
        }
    }
}
