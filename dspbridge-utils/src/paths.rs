//! Filesystem locations
//!
//! XDG base directories via `directories`, with dotfile paths under `$HOME`
//! when the platform lookup fails.

use std::path::PathBuf;

use directories::ProjectDirs;

const APP_NAME: &str = "dspbridge";

/// Base directory kinds the bridge uses
#[derive(Debug, Clone, Copy)]
enum Base {
    Config,
    State,
    Data,
}

impl Base {
    fn resolve(self) -> PathBuf {
        let dirs = ProjectDirs::from("", "", APP_NAME);
        let found = dirs.as_ref().and_then(|dirs| match self {
            Base::Config => Some(dirs.config_dir()),
            // No state dir on macOS or Windows
            Base::State => dirs.state_dir(),
            Base::Data => Some(dirs.data_local_dir()),
        });
        match found {
            Some(path) => path.to_path_buf(),
            None => self.fallback(),
        }
    }

    fn fallback(self) -> PathBuf {
        let relative: &[&str] = match self {
            Base::Config => &[".config"],
            Base::State => &[".local", "state"],
            Base::Data => &[".local", "share"],
        };
        relative
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join(APP_NAME)
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// `$XDG_CONFIG_HOME/dspbridge`
pub fn config_dir() -> PathBuf {
    Base::Config.resolve()
}

/// Default configuration file, `config.toml` in [`config_dir`]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// `$XDG_STATE_HOME/dspbridge`
pub fn state_dir() -> PathBuf {
    Base::State.resolve()
}

/// `$XDG_DATA_HOME/dspbridge`
pub fn data_dir() -> PathBuf {
    Base::Data.resolve()
}

/// Log files, under the state directory
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Default root of recorded plugin responses
pub fn fixture_dir() -> PathBuf {
    data_dir().join("fixtures")
}
