//! We can have a little hard-coded config, [as a
//! snack](https://knowyourmeme.com/memes/cats-can-have-a-little-salami).
//! Whatever is worth changing per machine comes from the environment (or a
//! `.env` file, via dotenvy).

use std::{env, net::SocketAddr, path::PathBuf};

/// The one storage key the whole session snapshot lives under.
pub const STORAGE_KEY: &str = "dmToolsSession";

/// How long a notice stays on screen before it is dismissed.
pub const NOTICE_DISPLAY_SECS: i64 = 3;

/// Marker colors, picked by list position.
pub const MARKER_PALETTE: [&str; 6] = [
    "#e53e3e", "#3182ce", "#38a169", "#d69e2e", "#805ad5", "#dd6b20",
];

pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DATA_DIR: &str = ".dmtools";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Keep saves in memory only; nothing is written to `data_dir`.
    pub ephemeral: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("DMTOOLS_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()?;
        let data_dir = env::var("DMTOOLS_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string())
            .into();
        let ephemeral = env::var("DMTOOLS_EPHEMERAL")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Config {
            addr,
            data_dir,
            ephemeral,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" TRUE "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_defaults_parse() {
        let addr: SocketAddr = DEFAULT_ADDR.parse().expect("valid default");
        assert_eq!(addr.port(), 8000);
    }
}
