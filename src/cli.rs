use crate::{mode::VisualizationMode, Result};
use anyhow::format_err;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use structopt::StructOpt;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Turns the two-microphone room sensor into the state driving the meeting-room sphere.
#[derive(StructOpt, Debug)]
pub struct Opt {
    /// How verbose should we be (normal = info, 1 = debug, 2+ = trace).
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    pub verbosity: u32,
    /// Location of the config file to load. Will try default locations otherwise (cwd and standard
    /// location.
    #[structopt(long = "config-file", parse(from_os_str))]
    pub config_file: Option<PathBuf>,
    /// Address (host:port) of the sensor board streaming newline-delimited JSON readings.
    #[structopt(long = "live")]
    pub live: Option<String>,
    /// Start replaying the recording straight away.
    #[structopt(long = "replay")]
    pub replay: bool,
    /// Replay this RON recording instead of the built-in meeting.
    #[structopt(long = "fixture", parse(from_os_str))]
    pub fixture: Option<PathBuf>,
    /// Initial visualization (audio, waves, stereo or activity).
    #[structopt(long = "mode", default_value = "audio")]
    pub mode: VisualizationMode,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Time between replayed samples.
    pub replay_tick_ms: u64,
    /// How often a chart is redrawn when nothing else asks for it.
    pub chart_refresh_ms: u64,
    /// Length of the synthesized series shown before any data arrives.
    pub placeholder_points: usize,
    /// Live samples kept for the charts and the spatial breakdown.
    pub live_history: usize,
    pub insights_history: usize,
    pub frame_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            replay_tick_ms: 150,
            chart_refresh_ms: 1000,
            placeholder_points: 100,
            live_history: 100,
            insights_history: 50,
            frame_rate: 60,
        }
    }
}

impl Config {
    /// Loads the config, if there is one.
    ///
    /// The rules for finding a config file are:
    ///
    ///  - Look at the location given as a parameter (if given).
    ///  - Look in the current directory
    ///  - Look in the project config directory (as defined by `directories` crate)
    pub fn load(loc: Option<impl AsRef<Path>>) -> Result<Self> {
        // parameter
        if let Some(loc) = loc {
            let loc = loc.as_ref();
            // Break on all errors, including not found
            log::info!("using config at \"{}\"", loc.display());
            let conf_raw = fs::read(loc)?;
            return Config::parse(&conf_raw);
        }

        // current dir
        fn load_from_current() -> Result<Option<Config>> {
            let current_dir = match env::current_dir() {
                Ok(dir) => dir,
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let current_dir_path = current_dir.join(CONFIG_FILE_NAME);
            let conf_raw = match fs::read(&current_dir_path) {
                Ok(x) => x,
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            log::info!("using config at \"{}\"", current_dir_path.display());
            Ok(Some(Config::parse(&conf_raw)?))
        }
        if let Some(conf) = load_from_current()? {
            return Ok(conf);
        }

        // project dir
        let dirs = ProjectDirs::from("org", "roomsphere", "roomsphere")
            .ok_or_else(|| format_err!("could not load project directories"))?;
        let config_path = dirs.config_dir().join(CONFIG_FILE_NAME);
        match fs::read(&config_path) {
            Ok(conf_raw) => {
                log::info!("using config at \"{}\"", config_path.display());
                Config::parse(&conf_raw)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => {
                log::info!("no config file found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and check a config file's contents.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let config: Config = toml::from_slice(raw)?;
        if config.replay_tick_ms == 0 {
            return Err(format_err!("replay_tick_ms must be at least 1"));
        }
        if config.frame_rate == 0 {
            return Err(format_err!("frame_rate must be at least 1"));
        }
        Ok(config)
    }

    pub fn replay_tick(&self) -> Duration {
        Duration::from_millis(self.replay_tick_ms)
    }

    pub fn chart_refresh(&self) -> Duration {
        Duration::from_millis(self.chart_refresh_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::parse(b"replay_tick_ms = 200\nlive_history = 10\n").unwrap();
        assert_eq!(config.replay_tick(), Duration::from_millis(200));
        assert_eq!(config.live_history, 10);
        assert_eq!(config.chart_refresh_ms, 1000);
        assert_eq!(config.placeholder_points, 100);
    }

    #[test]
    fn rejects_zero_intervals() {
        assert!(Config::parse(b"replay_tick_ms = 0").is_err());
        assert!(Config::parse(b"frame_rate = 0").is_err());
        assert!(Config::parse(b"frame_rate = \"fast\"").is_err());
    }

    #[test]
    fn explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "frame_rate = 30").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.frame_interval().as_micros(), 33_333);
        // an explicit path that doesn't exist is an error, not a fallback
        assert!(Config::load(Some(dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn parse_opts() {
        let opt = Opt::from_iter(vec!["roomsphere", "-vv", "--replay", "--mode", "stereo"]);
        assert_eq!(opt.verbosity, 2);
        assert!(opt.replay);
        assert_eq!(opt.mode, VisualizationMode::ChartStereo);
        assert!(opt.live.is_none());
        assert!(Opt::from_iter_safe(vec!["roomsphere", "--mode", "hologram"]).is_err());
    }
}
