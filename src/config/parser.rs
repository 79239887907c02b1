use super::{Config, MAX_PARALLEL_THREADS};
use anyhow::{Context, Result};
use std::path::Path;

/// Read and validate a TOML config file
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or holds
/// out-of-range values
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate TOML config text
///
/// # Errors
///
/// Returns an error if the text is not valid TOML or holds out-of-range
/// values
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    validate_parallel_threads(config.performance.parallel_threads)
}

pub(crate) fn validate_parallel_threads(threads: usize) -> Result<()> {
    if threads == 0 {
        anyhow::bail!("Parallel threads must be at least 1");
    }
    if threads > MAX_PARALLEL_THREADS {
        anyhow::bail!("Parallel threads cannot exceed {MAX_PARALLEL_THREADS}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkBackend;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config_str(
            r#"
            [performance]
            parallel_threads = 2

            [walk]
            backend = "local"

            [render]
            literal_tokens = true
            "#,
        )
        .unwrap();

        assert_eq!(config.performance.parallel_threads, 2);
        assert_eq!(config.walk.backend, WalkBackend::Local);
        assert!(config.render.literal_tokens);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config_str("[render]\nliteral_tokens = true\n").unwrap();
        assert_eq!(config.walk.backend, WalkBackend::Pool);
        assert!(config.performance.parallel_threads >= 1);
    }

    #[test]
    fn test_thread_bounds() {
        let zero = parse_config_str("[performance]\nparallel_threads = 0\n").unwrap_err();
        assert!(zero.to_string().contains("at least 1"));

        let huge = parse_config_str("[performance]\nparallel_threads = 513\n").unwrap_err();
        assert!(huge.to_string().contains("cannot exceed 512"));

        assert!(parse_config_str("[performance]\nparallel_threads = 512\n").is_ok());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(parse_config_str("[walk]\nbackend = \"ftp\"\n").is_err());
    }
}
