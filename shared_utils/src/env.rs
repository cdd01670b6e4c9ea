use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// A variable that is set but blank (only whitespace) counts as missing, since
/// every caller in this workspace treats an empty credential or path as unset.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    get_optional_env_var(name).ok_or_else(|| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable.
///
/// Returns `None` when the variable is unset, not valid unicode, or blank.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads an optional environment variable, falling back to `default` when unset.
pub fn get_env_var_or(name: &str, default: &str) -> String {
    get_optional_env_var(name).unwrap_or_else(|| default.to_string())
}
