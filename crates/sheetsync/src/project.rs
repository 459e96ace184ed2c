//! Project manifest: sync configuration plus the `[auth]` table.

use crate::cli::CliError;
use serde::Deserialize;
use sheetsync_engine::{SpreadsheetConfig, SyncManifest, load_manifest};
use sheetsync_google::{AuthConfig, ProviderSettings, SheetsProvider};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Deserialize)]
struct AuthSection {
    #[serde(default)]
    auth: AuthConfig,
}

/// A loaded and validated project manifest
#[derive(Debug, Clone)]
pub struct Project {
    /// Spreadsheets and output settings
    pub manifest: SyncManifest,
    /// Credentials settings
    pub auth: AuthConfig,
    /// Directory holding the manifest; output roots are relative to it
    pub dir: PathBuf,
    base_url: Option<String>,
    token_url: Option<String>,
}

impl Project {
    /// Load and validate the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if the file is missing, malformed or
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Err(CliError::config_with_help(
                format!("Manifest not found: {}", path.display()),
                "Create a sheetsync.toml or pass --config <PATH>",
            ));
        }

        let manifest: SyncManifest = load_manifest(path)?;
        manifest.validate()?;
        let section: AuthSection = load_manifest(path)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let auth = section.auth.relative_to(&dir);

        tracing::debug!(
            manifest = %path.display(),
            spreadsheets = manifest.spreadsheets.len(),
            auth = auth.method(),
            "Loaded project manifest"
        );

        Ok(Self {
            manifest,
            auth,
            dir,
            base_url: None,
            token_url: None,
        })
    }

    /// Send Sheets requests to a different endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Exchange OAuth refresh tokens at a different endpoint
    #[must_use]
    pub fn with_token_url(mut self, token_url: Option<String>) -> Self {
        self.token_url = token_url;
        self
    }

    /// Directory config files are written below
    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        self.manifest.project_root(&self.dir)
    }

    /// Connection settings derived from the manifest
    #[must_use]
    pub fn provider_settings(&self) -> ProviderSettings {
        let mut settings = ProviderSettings {
            request_timeout: Duration::from_secs(self.manifest.request_timeout_secs),
            ..ProviderSettings::default()
        };
        if let Some(base_url) = &self.base_url {
            settings.base_url.clone_from(base_url);
        }
        if let Some(token_url) = &self.token_url {
            settings.token_url.clone_from(token_url);
        }
        settings
    }

    /// An unconnected provider for this project
    #[must_use]
    pub fn provider(&self) -> SheetsProvider {
        SheetsProvider::with_settings(self.auth.clone(), self.provider_settings())
    }

    /// Spreadsheets to sync: all of them, or the ones named in `only`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` naming the first entry that matches no
    /// spreadsheet.
    pub fn select(&self, only: &[String]) -> Result<Vec<SpreadsheetConfig>, CliError> {
        if only.is_empty() {
            return Ok(self.manifest.spreadsheets.clone());
        }

        only.iter()
            .map(|name| {
                self.manifest.find(name).cloned().ok_or_else(|| {
                    CliError::config_with_help(
                        format!("No spreadsheet named '{name}' in the manifest"),
                        format!("Configured spreadsheets: {}", self.names().join(", ")),
                    )
                })
            })
            .collect()
    }

    /// Display names of the configured spreadsheets
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.manifest
            .spreadsheets
            .iter()
            .map(SpreadsheetConfig::display_name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{EXIT_AUTH, exit_code_for};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    const MANIFEST: &str = r#"
root = "Assets/Configs"
request_timeout_secs = 5

[auth]
method = "api-key"
key_env = "BALANCE_KEY"

[[spreadsheets]]
name = "Balance"
id = "1AbC"

[[spreadsheets.sheets]]
output = "Enemies"
tab_id = 0

[[spreadsheets]]
name = "Loot"
id = "2XyZ"
"#;

    fn project(content: &str) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sheetsync.toml");
        std::fs::write(&path, content).unwrap();
        let project = Project::load(&path).unwrap();
        (temp, project)
    }

    #[test]
    fn test_load_project() {
        let (temp, project) = project(MANIFEST);

        assert_eq!(project.auth.method(), "api-key");
        assert_eq!(project.names(), vec!["Balance", "Loot"]);
        assert_eq!(project.output_root(), temp.path().join("Assets/Configs"));
        assert_eq!(
            project.provider_settings().request_timeout,
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn test_missing_auth_table_fails_to_connect() {
        let (_temp, project) = project("[[spreadsheets]]\nid = \"x\"\n");

        let Err(err) = project
            .provider()
            .get_or_connect(&CancellationToken::new())
            .await
        else {
            panic!("connected without credentials");
        };
        let err = CliError::from(err);
        assert!(matches!(err, CliError::Auth { .. }));
        assert_eq!(exit_code_for(&err), EXIT_AUTH);
    }

    #[test]
    fn test_oauth_files_resolve_against_manifest_dir() {
        let (temp, project) = project(
            "[auth]\nmethod = \"oauth\"\ncredentials_file = \"client_secret.json\"\ntoken_file = \"/abs/token.json\"\n",
        );

        match &project.auth {
            AuthConfig::OAuth {
                credentials_file,
                token_file,
                ..
            } => {
                assert_eq!(
                    credentials_file.as_deref(),
                    Some(temp.path().join("client_secret.json").as_path())
                );
                assert_eq!(token_file.as_deref(), Some(Path::new("/abs/token.json")));
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = Project::load(&temp.path().join("sheetsync.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_invalid_manifest_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sheetsync.toml");
        std::fs::write(&path, "concurrency = 0\n").unwrap();

        let err = Project::load(&path).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_select() {
        let (_temp, project) = project(MANIFEST);

        assert_eq!(project.select(&[]).unwrap().len(), 2);

        let selected = project.select(&["2XyZ".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Loot");

        let err = project.select(&["Nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_base_url_override() {
        let (_temp, project) = project(MANIFEST);
        let project = project
            .with_base_url(Some("http://localhost:9999".to_string()))
            .with_token_url(Some("http://localhost:9999/token".to_string()));

        let settings = project.provider_settings();
        assert_eq!(settings.base_url, "http://localhost:9999");
        assert_eq!(settings.token_url, "http://localhost:9999/token");
    }
}
