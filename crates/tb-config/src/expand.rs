//! `${VAR}` expansion for configuration strings.
//!
//! - `${VAR}` expands to the value of VAR and errors if it is unset
//! - `${VAR:-default}` falls back to `default` when VAR is unset
//!
//! Bare `$VAR` is left as-is.

use crate::ConfigError;

/// Expand `${...}` references in `value`. `field` names the setting in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.var_name),
    })
}

/// Expand an optional setting.
pub(crate) fn expand_opt(value: Option<&String>, field: &str) -> Result<Option<String>, ConfigError> {
    value.map(|v| expand_env(v, field)).transpose()
}

/// Unset variable found during expansion.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("TB_TEST_API_HOST", "blog.example.com");
        }
        let result = expand_env("https://${TB_TEST_API_HOST}/api", "api.base_url").unwrap();
        assert_eq!(result, "https://blog.example.com/api");
        unsafe {
            std::env::remove_var("TB_TEST_API_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("TB_TEST_UNSET_KROKI");
        }
        let result =
            expand_env("${TB_TEST_UNSET_KROKI:-https://kroki.io}", "diagrams.kroki_url").unwrap();
        assert_eq!(result, "https://kroki.io");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("TB_TEST_MISSING_TOKEN");
        }
        let err = expand_env("${TB_TEST_MISSING_TOKEN}", "api.token").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("TB_TEST_MISSING_TOKEN"));
        assert!(err.to_string().contains("api.token"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        assert_eq!(expand_env("tok$en", "api.token").unwrap(), "tok$en");
        assert_eq!(expand_env("plain", "api.token").unwrap(), "plain");
    }

    #[test]
    fn test_expand_opt_none() {
        assert_eq!(expand_opt(None, "api.token").unwrap(), None);
    }
}
