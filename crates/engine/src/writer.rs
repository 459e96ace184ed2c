//! Config file output.
//!
//! A [`ConfigWriter`] stores one [`Document`] under an output name. The
//! filesystem implementation maps `Enemies/Stats` to
//! `<root>/Enemies/Stats.json`, creating parent directories as needed and
//! leaving files whose content is already up to date untouched. File I/O
//! goes through `tokio::fs` so writes never block a runtime worker.

use crate::{Document, Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Status of a file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// File was newly created.
    Created,
    /// File existed and was updated with new content.
    Updated,
    /// File existed and content was unchanged.
    Unchanged,
    /// Would be created (dry-run mode).
    WouldCreate,
    /// Would be updated (dry-run mode).
    WouldUpdate,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Updated => write!(f, "Updated"),
            Self::Unchanged => write!(f, "Unchanged"),
            Self::WouldCreate => write!(f, "Would create"),
            Self::WouldUpdate => write!(f, "Would update"),
        }
    }
}

/// Result of writing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Destination path
    pub path: PathBuf,
    /// What happened to the file
    pub status: FileStatus,
}

/// Destination for parsed documents
#[async_trait]
pub trait ConfigWriter: Send + Sync {
    /// Store `document` under `output_name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the name is not a valid destination or the
    /// file cannot be written.
    async fn write(&self, output_name: &str, document: &Document) -> Result<WrittenFile>;
}

/// Writes documents as pretty-printed JSON files below a project root
#[derive(Debug, Clone)]
pub struct FsConfigWriter {
    root: PathBuf,
    extension: String,
    dry_run: bool,
}

impl FsConfigWriter {
    /// Default file extension for written configs
    pub const DEFAULT_EXTENSION: &'static str = "json";

    /// Create a writer rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: Self::DEFAULT_EXTENSION.to_string(),
            dry_run: false,
        }
    }

    /// Report what would change without touching the filesystem
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use a different file extension (without the leading dot)
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Project root that output names are relative to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for an output name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the name is empty, absolute, or contains
    /// `..` components.
    pub fn path_for(&self, output_name: &str) -> Result<PathBuf> {
        validate_output_name(output_name)?;
        Ok(self
            .root
            .join(format!("{output_name}.{}", self.extension)))
    }
}

#[async_trait]
impl ConfigWriter for FsConfigWriter {
    async fn write(&self, output_name: &str, document: &Document) -> Result<WrittenFile> {
        let path = self.path_for(output_name)?;
        let content = document.to_pretty_string();

        let status = if self.dry_run {
            match read_existing(&path).await? {
                Some(existing) if existing == content => FileStatus::Unchanged,
                Some(_) => FileStatus::WouldUpdate,
                None => FileStatus::WouldCreate,
            }
        } else {
            write_config_file(&path, &content).await?
        };

        tracing::info!(path = %path.display(), status = %status, "Processed config file");
        Ok(WrittenFile { path, status })
    }
}

/// Reject output names that would land outside the project root.
fn validate_output_name(output_name: &str) -> Result<()> {
    if output_name.trim().is_empty() {
        return Err(Error::write(output_name, "output name cannot be empty"));
    }

    let path = Path::new(output_name);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::write(
                    output_name,
                    "output name cannot contain parent directory references",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::write(output_name, "output name must be relative"));
            }
        }
    }

    Ok(())
}

async fn read_existing(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::write_io(e, path, "read")),
    }
}

/// Write a config file and return the status.
async fn write_config_file(path: &Path, content: &str) -> Result<FileStatus> {
    let status = match read_existing(path).await? {
        Some(existing) if existing == content => return Ok(FileStatus::Unchanged),
        Some(_) => FileStatus::Updated,
        None => FileStatus::Created,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::write_io(e, parent, "create directory"))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::write_io(e, path, "write"))?;
    Ok(status)
}
