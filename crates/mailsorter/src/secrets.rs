//! Secret resolution for account passwords and service keys.
//!
//! A secret can come from three places, tried in this order:
//!
//! 1. **Direct value** in the settings file (`password`)
//! 2. **File** holding the value (`passwordFile`), e.g. a Docker secret
//! 3. **Environment variable** (`passwordEnvVar`)
//!
//! Empty strings count as "not configured" so a blank field in settings does not
//! shadow a later source.

use std::fs;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a secret may be read from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    pub direct: Option<&'a str>,
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    /// Resolves the secret from the first configured source.
    ///
    /// File contents and env var values are trimmed.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = non_empty(self.direct) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(self.file) {
            let expanded = expand_home(path);
            return fs::read_to_string(&expanded)
                .map(|content| SecretString::from(content.trim().to_string()))
                .map_err(|source| SecretError::FileReadError {
                    path: expanded,
                    source,
                });
        }

        if let Some(name) = non_empty(self.env_var) {
            return match std::env::var(name) {
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`resolve`](Self::resolve), but an unconfigured secret is `None`.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>> {
        match self.resolve() {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretError::NoSourceProvided) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_configured(&self) -> bool {
        non_empty(self.direct).is_some()
            || non_empty(self.file).is_some()
            || non_empty(self.env_var).is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Expands a leading `~` to the home directory (`~user` is not supported).
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source<'a>(
        direct: Option<&'a str>,
        file: Option<&'a str>,
        env_var: Option<&'a str>,
    ) -> SecretSource<'a> {
        SecretSource {
            direct,
            file,
            env_var,
        }
    }

    // Tests that modify environment variables must run serially
    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("MAILSORTER_TEST_SECRET_1", "env_value");
        let secret = source(Some("direct_value"), None, Some("MAILSORTER_TEST_SECRET_1"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "direct_value");
        std::env::remove_var("MAILSORTER_TEST_SECRET_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  file_value  ").unwrap();

        std::env::set_var("MAILSORTER_TEST_SECRET_2", "env_value");
        let secret = source(
            None,
            Some(file.path().to_str().unwrap()),
            Some("MAILSORTER_TEST_SECRET_2"),
        )
        .resolve()
        .unwrap();
        assert_eq!(secret.expose_secret(), "file_value");
        std::env::remove_var("MAILSORTER_TEST_SECRET_2");
    }

    #[test]
    #[serial]
    fn test_empty_values_fall_through_to_env() {
        std::env::set_var("MAILSORTER_TEST_SECRET_3", " env_value\n");
        let secret = source(Some(""), Some(""), Some("MAILSORTER_TEST_SECRET_3"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "env_value");
        std::env::remove_var("MAILSORTER_TEST_SECRET_3");
    }

    #[test]
    fn test_no_source() {
        let src = source(None, None, None);
        assert!(!src.is_configured());
        assert!(matches!(src.resolve(), Err(SecretError::NoSourceProvided)));
        assert!(src.resolve_optional().unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = source(None, Some("/nonexistent/mailsorter/secret"), None).resolve();
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));
    }

    #[test]
    fn test_env_var_not_set() {
        let result = source(None, None, Some("MAILSORTER_DEFINITELY_NOT_SET_12345")).resolve();
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
        // An unset variable is a configuration error, not an absent secret.
        assert!(source(None, None, Some("MAILSORTER_DEFINITELY_NOT_SET_12345"))
            .resolve_optional()
            .is_err());
    }

    #[test]
    fn test_is_configured() {
        assert!(source(Some("x"), None, None).is_configured());
        assert!(source(None, Some("/path"), None).is_configured());
        assert!(source(None, None, Some("VAR")).is_configured());
        assert!(!source(Some(""), Some(""), Some("")).is_configured());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/~/path"), "relative/~/path");

        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy().into_owned();
            assert_eq!(expand_home("~/secret"), format!("{}/secret", home));
            assert_eq!(expand_home("~"), home);
        }
    }
}
