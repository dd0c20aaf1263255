//! Download install method.
//!
//! Fetches a release artifact over HTTP and unpacks one executable from it.
//! Supports:
//! - Template variables in the URL: `{version}`, `{os}`, `{arch}`
//! - `.tar.gz`/`.tgz` and `.zip` archives, or a raw binary
//! - Optional SHA-256 verification of the downloaded artifact
//! - `file://` URLs for artifacts mirrored on a local filesystem
//!
//! Tools land in `<tools_dir>/downloads/<name>/<version>/<binary>`.

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

use super::platform::Platform;
use crate::config::Settings;
use crate::{Error, Result};

/// A release artifact that contains the tool's executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInstall {
    name: String,
    version: String,
    url_template: String,
    archive_path: Option<String>,
    sha256: Option<String>,
    dest_root: PathBuf,
}

impl DownloadInstall {
    /// Declare a download of `name` at `version` from `url_template`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url_template: impl Into<String>,
        settings: &Settings,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url_template: url_template.into(),
            archive_path: None,
            sha256: None,
            dest_root: settings.downloads_dir(),
        }
    }

    /// Path of the executable inside the archive (suffix match).
    ///
    /// Defaults to the tool name.
    #[must_use]
    pub fn archive_path(mut self, path: impl Into<String>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    /// Expected SHA-256 of the downloaded artifact, hex encoded.
    #[must_use]
    pub fn sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into().to_lowercase());
        self
    }

    /// Directory the executable is unpacked into.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.dest_root.join(&self.name).join(&self.version)
    }

    /// The URL for the current platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the template uses `{os}` or `{arch}` on an
    /// unrecognised platform.
    pub fn url(&self) -> Result<String> {
        if !self.url_template.contains("{os}") && !self.url_template.contains("{arch}") {
            return Ok(self.url_template.replace("{version}", &self.version));
        }
        let platform = Platform::current().ok_or_else(|| {
            Error::install_method(self.to_string(), "unsupported host platform")
        })?;
        Ok(expand_template(&self.url_template, &self.version, &platform))
    }

    fn binary_name(&self) -> &str {
        let path = self.archive_path.as_deref().unwrap_or(&self.name);
        Path::new(path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
    }

    pub(crate) fn executable_path(&self) -> PathBuf {
        self.install_dir().join(self.binary_name())
    }

    pub(crate) fn is_already_installed(&self) -> bool {
        self.executable_path().is_file()
    }

    pub(crate) fn attempt_install(&self) -> Result<()> {
        let url = self.url()?;
        info!(tool = %self.name, version = %self.version, %url, "Downloading tool");
        let data = fetch(&url)?;

        if let Some(expected) = &self.sha256 {
            let actual = hex::encode(Sha256::digest(&data));
            if &actual != expected {
                return Err(Error::DigestMismatch {
                    url,
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!(%url, "Digest verified");
        }

        let wanted = self.archive_path.as_deref().unwrap_or(&self.name);
        let artifact = url.rsplit('/').next().unwrap_or(&url);
        let dest = self.executable_path();
        extract_binary(&data, artifact, wanted, &dest)?;
        info!(tool = %self.name, path = %dest.display(), "Installed downloaded tool");
        Ok(())
    }
}

impl std::fmt::Display for DownloadInstall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} from {}", self.name, self.version, self.url_template)
    }
}

/// Expand template variables in a string.
fn expand_template(template: &str, version: &str, platform: &Platform) -> String {
    template
        .replace("{version}", version)
        .replace("{os}", &platform.os.to_string())
        .replace("{arch}", &platform.arch.to_string())
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    if let Some(path) = url.strip_prefix("file://") {
        debug!(%path, "Reading local artifact");
        return std::fs::read(path).map_err(|e| Error::download(url, e.to_string()));
    }
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("toolshed/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::download(url, e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::download(url, e.to_string()))?;
    if !response.status().is_success() {
        return Err(Error::download(url, format!("HTTP {}", response.status())));
    }
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| Error::download(url, e.to_string()))
}

/// Extract the entry whose path ends with `wanted` and write it to `dest`.
fn extract_binary(data: &[u8], artifact: &str, wanted: &str, dest: &Path) -> Result<()> {
    let content = if artifact.ends_with(".zip") {
        find_in_zip(data, artifact, wanted)?
    } else if artifact.ends_with(".tar.gz") || artifact.ends_with(".tgz") {
        find_in_tar_gz(data, artifact, wanted)?
    } else {
        // Assume it's a raw binary
        data.to_vec()
    };
    write_executable(dest, &content)
}

fn entry_matches(entry: &str, wanted: &str) -> bool {
    entry == wanted || entry.ends_with(&format!("/{wanted}"))
}

fn find_in_zip(data: &[u8], artifact: &str, wanted: &str) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::archive(artifact, format!("Failed to open zip: {e}")))?;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::archive(artifact, format!("Failed to read zip entry: {e}")))?;
        if file.is_file() && entry_matches(file.name(), wanted) {
            let mut content = Vec::new();
            file.read_to_end(&mut content)
                .map_err(|e| Error::archive(artifact, e.to_string()))?;
            return Ok(content);
        }
    }
    Err(Error::archive(artifact, format!("Binary '{wanted}' not found in archive")))
}

fn find_in_tar_gz(data: &[u8], artifact: &str, wanted: &str) -> Result<Vec<u8>> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    let entries = archive
        .entries()
        .map_err(|e| Error::archive(artifact, format!("Failed to read tar: {e}")))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::archive(artifact, format!("Failed to read tar entry: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| Error::archive(artifact, format!("Invalid path in tar: {e}")))?
            .to_string_lossy()
            .into_owned();
        if entry_matches(&path, wanted) {
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| Error::archive(artifact, e.to_string()))?;
            return Ok(content);
        }
    }
    Err(Error::archive(artifact, format!("Binary '{wanted}' not found in archive")))
}

/// Write `content` to `dest` with mode 0755, via a temporary name in the same directory.
fn write_executable(dest: &Path, content: &[u8]) -> Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| Error::configuration(format!("No parent for {}", dest.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| Error::io(e, Some(dir), "creating install directory"))?;
    let partial = dest.with_extension("partial");
    std::fs::write(&partial, content)
        .map_err(|e| Error::io(e, Some(partial.as_path()), "writing downloaded binary"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::io(e, Some(partial.as_path()), "marking binary executable"))?;
    }
    std::fs::rename(&partial, dest).map_err(|e| Error::io(e, Some(dest), "moving binary into place"))
}
