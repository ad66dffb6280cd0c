use anyhow::{Context, Result};
use linkledger::config::Config;
use std::path::Path;

pub async fn init_config(path: &Path) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("linkledger.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let toml_content = format!(
        r#"# linkledger configuration

[storage]
# Record table; created with a header row on first use
table_path = "{}"

[browser]
headless = {}
# executable = "/usr/bin/chromium"
navigation_timeout_secs = {}

[http]
listen_addr = "{}"
cors_enabled = {}

[sync]
# gist_id is printed by the first `linkledger sync push`
# gist_id = ""
file_name = "{}"
# token = ""  # or set GITHUB_TOKEN
attempts = {}
retry_delay_ms = {}

[logging]
format = "text"
level = "{}"

# One section per source. Links whose URLs match an existing record after
# dropping the listed query parameters are treated as duplicates.
[sources.example]
url = "https://example.com/jobs"
extraction_command = "Array.from(document.querySelectorAll('a')).map(a => a.href)"
normalization_params = ["searchId"]
"#,
        config.storage.table_path.display(),
        config.browser.headless,
        config.browser.navigation_timeout_secs,
        config.http.listen_addr,
        config.http.cors_enabled,
        config.sync.file_name,
        config.sync.attempts,
        config.sync.retry_delay_ms,
        config.logging.level,
    );

    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sample_config_loads() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path()).await.unwrap();

        let config = Config::load(&dir.path().join("linkledger.toml")).unwrap();
        let example = config.source("example").unwrap();
        assert_eq!(example.normalization_params, vec!["searchId".to_string()]);
        assert!(config.sync.gist_id.is_none());

        // never overwrites
        assert!(init_config(dir.path()).await.is_err());
    }
}
