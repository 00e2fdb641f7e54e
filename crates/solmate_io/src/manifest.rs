//! Cosmetic asset manifests.
//!
//! Each asset kind has a `manifest.json` under its directory in the asset
//! root, holding an array of [`ManifestEntry`] values. The files are re-read
//! on every lookup so edits take effect without a restart.

use crate::error::{Result, StoreError};
use solmate_data::{AssetKind, ManifestEntry};
use std::path::{Path, PathBuf};

const ROW_NAMES: [&str; 3] = ["top", "middle", "bottom"];
const COL_NAMES: [&str; 3] = ["left", "center", "right"];

/// Side length of the decoration grid.
pub const GRID_SIZE: u8 = 3;

/// Read access to the asset manifests under one root directory.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
}

impl AssetCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest_path(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.dir_name()).join("manifest.json")
    }

    /// All entries for `kind`. A missing manifest is an empty catalog.
    pub fn entries(&self, kind: AssetKind) -> Result<Vec<ManifestEntry>> {
        let path = self.manifest_path(kind);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Manifest not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::from(e)
                    .with_context(format!("reading manifest {}", path.display())))
            }
        };
        serde_json::from_str(&content)
            .map_err(|e| StoreError::manifest(format!("{}: {}", path.display(), e)))
    }

    pub fn find_by_name(&self, kind: AssetKind, name: &str) -> Result<Option<ManifestEntry>> {
        Ok(self.entries(kind)?.into_iter().find(|e| e.name == name))
    }

    /// Looks an entry up by the public URL clients send back.
    pub fn find_by_url(&self, kind: AssetKind, url: &str) -> Result<Option<ManifestEntry>> {
        Ok(self.entries(kind)?.into_iter().find(|e| e.url(kind) == url))
    }
}

/// Grid cell a decoration file is drawn for, from names like
/// `top_left_rock.png`. Returns `None` for files without a valid prefix.
#[must_use]
pub fn decoration_slot(filename: &str) -> Option<(u8, u8)> {
    let mut parts = filename.splitn(3, '_');
    let row = parts.next()?;
    let col = parts.next()?;
    let rest = parts.next()?;
    if rest.is_empty() {
        return None;
    }
    let row = ROW_NAMES.iter().position(|n| *n == row)?;
    let col = COL_NAMES.iter().position(|n| *n == col)?;
    Some((row as u8, col as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmate_data::UnlockRequirement;
    use std::fs;

    fn write_manifest(root: &Path, kind: AssetKind, body: &str) {
        let dir = root.join(kind.dir_name());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("manifest.json"), body).unwrap();
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalog::new(dir.path());
        assert!(catalog.entries(AssetKind::Background).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), AssetKind::Decoration, "{ not json");
        let catalog = AssetCatalog::new(dir.path());
        let err = catalog.entries(AssetKind::Decoration).unwrap_err();
        assert!(matches!(err, StoreError::Manifest(_)));
    }

    #[test]
    fn test_lookup_by_name_and_url() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            AssetKind::Background,
            r#"[
                {"name": "meadow", "filename": "meadow.png"},
                {"name": "gold", "filename": "gold.png", "unlock": {"type": "paid", "amount": 0.25}}
            ]"#,
        );
        let catalog = AssetCatalog::new(dir.path());

        let gold = catalog
            .find_by_name(AssetKind::Background, "gold")
            .unwrap()
            .unwrap();
        assert_eq!(gold.unlock, UnlockRequirement::Paid { amount: 0.25 });

        let meadow = catalog
            .find_by_url(AssetKind::Background, "/assets/background/meadow.png")
            .unwrap()
            .unwrap();
        assert_eq!(meadow.name, "meadow");
        assert_eq!(meadow.unlock, UnlockRequirement::Free);

        assert!(catalog
            .find_by_name(AssetKind::Background, "lava")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decoration_slot() {
        assert_eq!(decoration_slot("top_left_rock.png"), Some((0, 0)));
        assert_eq!(decoration_slot("middle_center_big-tree.png"), Some((1, 1)));
        assert_eq!(decoration_slot("bottom_right_x_y.png"), Some((2, 2)));
        assert_eq!(decoration_slot("upper_left_rock.png"), None);
        assert_eq!(decoration_slot("top_left_"), None);
        assert_eq!(decoration_slot("rock.png"), None);
    }
}
