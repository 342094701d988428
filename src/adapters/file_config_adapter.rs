//! INI file configuration adapter.

use crate::domain::error::StockdashError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StockdashError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| StockdashError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StockdashError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StockdashError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// No file given: every lookup falls through to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_sections_and_keys() {
        let adapter = FileConfigAdapter::from_string(
            "[api]\nbase_url = http://localhost:8000\n\n[dashboard]\nfetch_limit = 1500\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_string("api", "base_url"),
            Some("http://localhost:8000".to_string())
        );
        assert_eq!(adapter.get_int("dashboard", "fetch_limit", 0), 1500);
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let adapter = FileConfigAdapter::from_string("[api]\nbase_url =\n").unwrap();
        assert_eq!(adapter.get_string("api", "base_url"), None);
        assert_eq!(adapter.get_string("missing", "key"), None);
    }

    #[test]
    fn int_defaults_for_missing_or_malformed() {
        let adapter = FileConfigAdapter::from_string("[cache]\nttl_secs = soon\n").unwrap();
        assert_eq!(adapter.get_int("cache", "ttl_secs", 60), 60);
        assert_eq!(adapter.get_int("cache", "max_entries", 7), 7);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[cache]\na = yes\nb = off\nc = 1\nd = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("cache", "a", false));
        assert!(!adapter.get_bool("cache", "b", true));
        assert!(adapter.get_bool("cache", "c", false));
        assert!(adapter.get_bool("cache", "d", true));
        assert!(!adapter.get_bool("cache", "d", false));
    }

    #[test]
    fn empty_adapter_has_no_values() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("api", "base_url"), None);
        assert_eq!(adapter.get_int("api", "timeout_secs", 30), 30);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[web]\nlisten = 0.0.0.0:9000\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("0.0.0.0:9000".to_string())
        );
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/stockdash.ini");
        assert!(matches!(result, Err(StockdashError::ConfigParse { .. })));
    }
}
