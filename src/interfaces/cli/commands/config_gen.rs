//! Generate config command

use std::path::Path;

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;

/// Generate example configuration file
///
/// 没有指定路径时直接打印到 stdout，方便重定向。
pub fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let content = StaticConfig::generate_sample_config();

    let Some(path) = output_path else {
        print!("{}", content);
        return Ok(());
    };

    if !force && Path::new(&path).exists() {
        return Err(CliError::CommandError(format!(
            "File already exists: {} (use --force to overwrite)",
            path
        )));
    }

    std::fs::write(&path, content)
        .map_err(|e| CliError::CommandError(format!("Failed to write {}: {}", path, e)))?;

    println!(
        "{} {}",
        "Configuration file generated:".green(),
        path.blue()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "existing").unwrap();
        let path = path.to_string_lossy().to_string();

        assert!(config_generate(Some(path.clone()), false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");

        config_generate(Some(path.clone()), true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[server]"));
    }
}
