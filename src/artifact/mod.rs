//! Backup artifact naming scheme
//!
//! Artifact filenames carry the subject identity, kind and creation order:
//!
//! - database: `<stamp>__<subject>.tar.zst`
//! - addons:   `<stamp>__<subject>__addons.tar.zst`
//!
//! The stamp is a fixed-width date-time string supplied by the caller, so
//! lexicographic order equals creation order. No other module parses
//! filenames directly; everything goes through [`ArtifactName`].

use std::path::{Path, PathBuf};

/// Reserved separator between filename segments
pub const SEPARATOR: &str = "__";

/// The archive extension produced and recognized by the pipelines
pub const ARCHIVE_EXT: &str = ".tar.zst";

/// Fixed tail segment marking an addons artifact
const ADDONS_TAG: &str = "addons";

/// What a backup artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Database dump + manifest + filestore
    Database,
    /// Snapshot of one addon directory
    Addons,
}

/// A decoded artifact filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Fixed-width creation stamp, sorts lexicographically
    pub stamp: String,
    /// Tenant/database name; addons artifacts append the flattened
    /// addon directory (see [`addon_subject`])
    pub subject: String,
    pub kind: ArtifactKind,
}

impl ArtifactName {
    pub fn database(stamp: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
            subject: subject.into(),
            kind: ArtifactKind::Database,
        }
    }

    pub fn addons(stamp: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
            subject: subject.into(),
            kind: ArtifactKind::Addons,
        }
    }

    /// Encode as a filename. Inverse of [`ArtifactName::decode`].
    pub fn encode(&self) -> String {
        match self.kind {
            ArtifactKind::Database => {
                format!("{}{}{}{}", self.stamp, SEPARATOR, self.subject, ARCHIVE_EXT)
            }
            ArtifactKind::Addons => format!(
                "{}{}{}{}{}{}",
                self.stamp, SEPARATOR, self.subject, SEPARATOR, ADDONS_TAG, ARCHIVE_EXT
            ),
        }
    }

    /// Decode a filename.
    ///
    /// Returns `None` ("not an artifact") for anything that does not match
    /// one of the two shapes, so unrelated files in the backup directory are
    /// silently skipped rather than treated as errors.
    pub fn decode(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(ARCHIVE_EXT)?;
        let parts: Vec<&str> = stem.split(SEPARATOR).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [stamp, subject] => Some(Self::database(*stamp, *subject)),
            [stamp, subject, tag] if *tag == ADDONS_TAG => Some(Self::addons(*stamp, *subject)),
            _ => None,
        }
    }
}

/// An artifact file present in the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub name: ArtifactName,
    pub path: PathBuf,
}

impl BackupArtifact {
    /// Decode a path into an artifact; `None` if the filename is not one
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let name = ArtifactName::decode(file_name)?;
        Some(Self {
            name,
            path: path.to_path_buf(),
        })
    }
}

/// Build the subject for an addons artifact: the tenant name with the
/// addon directory's flattened relative path appended.
pub fn addon_subject(db_name: &str, folder: &str) -> String {
    let flat = folder.trim_matches('/').replace(['/', '\\'], "_");
    format!("{}_{}", db_name, flat)
}

/// Derive the restore destination folder from an addons subject: the
/// trailing path component recorded at backup time.
pub fn addon_destination(subject: &str) -> &str {
    subject.rsplit('_').next().unwrap_or(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_database_artifact() {
        let name = ArtifactName::decode("20240101_000000__acme.tar.zst").unwrap();
        assert_eq!(name.stamp, "20240101_000000");
        assert_eq!(name.subject, "acme");
        assert_eq!(name.kind, ArtifactKind::Database);
    }

    #[test]
    fn test_decode_addons_artifact() {
        let name = ArtifactName::decode("20240101_000000__acme_addons__addons.tar.zst").unwrap();
        assert_eq!(name.stamp, "20240101_000000");
        assert_eq!(name.subject, "acme_addons");
        assert_eq!(name.kind, ArtifactKind::Addons);
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let valid = [
            "20240101_000000__acme.tar.zst",
            "20240601_120000__acme__addons.tar.zst",
            "20241201_235959__other_tenant__addons.tar.zst",
            "20241201_235959__a.tar.zst",
        ];
        for file_name in valid {
            let decoded = ArtifactName::decode(file_name).unwrap();
            assert_eq!(decoded.encode(), file_name);
        }
    }

    #[test]
    fn test_decode_rejects_non_artifacts() {
        let invalid = [
            "readme.txt",
            "20240101_000000__acme.tar.gz",
            "20240101_000000.tar.zst",
            "__acme.tar.zst",
            "20240101_000000__.tar.zst",
            "20240101_000000__acme__industry.tar.zst",
            "20240101_000000__acme__addons__extra.tar.zst",
            ".tar.zst",
        ];
        for file_name in invalid {
            assert_eq!(ArtifactName::decode(file_name), None, "{}", file_name);
        }
    }

    #[test]
    fn test_from_path() {
        let path = Path::new("/backups/20240101_000000__acme.tar.zst");
        let artifact = BackupArtifact::from_path(path).unwrap();
        assert_eq!(artifact.name.subject, "acme");
        assert_eq!(artifact.path, path);

        assert!(BackupArtifact::from_path(Path::new("/backups/notes.md")).is_none());
    }

    #[test]
    fn test_addon_subject_flattens_path() {
        assert_eq!(addon_subject("acme", "addons"), "acme_addons");
        assert_eq!(addon_subject("acme", "custom/themes"), "acme_custom_themes");
    }

    #[test]
    fn test_addon_destination() {
        assert_eq!(addon_destination("acme_addons"), "addons");
        assert_eq!(addon_destination("acme_custom_themes"), "themes");
        assert_eq!(addon_destination("acme"), "acme");
    }
}
