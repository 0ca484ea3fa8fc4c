//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so a bare `$` (common in
/// ping URLs and shell commands) never triggers expansion.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand every string inside a TOML value, recursing into arrays and tables.
///
/// `field` names the value for error messages; nested keys and indices are
/// appended (`publish[0].urls[1]`).
pub(crate) fn expand_toml(value: &mut toml::Value, field: &str) -> Result<(), ConfigError> {
    match value {
        toml::Value::String(s) => *s = expand_env(s, field)?,
        toml::Value::Array(items) => {
            for (idx, item) in items.iter_mut().enumerate() {
                expand_toml(item, &format!("{field}[{idx}]"))?;
            }
        }
        toml::Value::Table(table) => {
            for (key, item) in table.iter_mut() {
                expand_toml(item, &format!("{field}.{key}"))?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Variable referenced without a default and missing from the environment.
struct UnsetVar(String);
