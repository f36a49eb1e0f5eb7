use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static TEMPORA_HOME: OnceLock<PathBuf> = OnceLock::new();
static TEMPORA_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the Tempora home directory
/// Checks TEMPORA_HOME environment variable, falls back to ${HOME}/.tempora
pub fn tempora_home() -> PathBuf {
    TEMPORA_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TEMPORA_HOME") {
                PathBuf::from(path)
            } else {
                let home = std::env::var("HOME").unwrap_or_else(|_| {
                    std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
                });
                PathBuf::from(home).join(".tempora")
            }
        })
        .clone()
}

/// Get the Tempora data directory
/// Checks TEMPORA_DATA_DIR environment variable, falls back to TEMPORA_HOME
pub fn tempora_data_dir() -> PathBuf {
    TEMPORA_DATA_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TEMPORA_DATA_DIR") {
                PathBuf::from(path)
            } else {
                tempora_home()
            }
        })
        .clone()
}

/// Default SQLite database file: TEMPORA_DATA_DIR/tempora.db
pub fn default_database_path() -> PathBuf {
    tempora_data_dir().join("tempora.db")
}

/// Default configuration file: TEMPORA_HOME/config.toml
pub fn default_config_path() -> PathBuf {
    tempora_home().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_is_under_data_dir() {
        let db = default_database_path();
        assert_eq!(db.file_name().unwrap(), "tempora.db");
        assert_eq!(db.parent().unwrap(), tempora_data_dir());
    }

    #[test]
    fn test_config_path_is_under_home() {
        assert_eq!(default_config_path().parent().unwrap(), tempora_home());
    }
}
