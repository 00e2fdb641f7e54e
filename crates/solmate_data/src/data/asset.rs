use serde::{Deserialize, Serialize};

/// How a cosmetic asset becomes available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnlockRequirement {
    Free,
    Level { level: u32 },
    Paid { amount: f64 },
}

impl UnlockRequirement {
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Paid { amount } => Some(*amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Decoration,
    Background,
}

impl AssetKind {
    /// Directory segment under the asset root.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Decoration => "decorations",
            Self::Background => "background",
        }
    }

    fn id_prefix(self) -> &'static str {
        match self {
            Self::Decoration => "decoration",
            Self::Background => "background",
        }
    }

    /// Purchase identifier, e.g. `background_sunset`.
    #[must_use]
    pub fn asset_id(self, name: &str) -> String {
        format!("{}_{}", self.id_prefix(), name)
    }

    /// Splits an asset identifier back into kind and manifest name.
    #[must_use]
    pub fn parse_asset_id(asset_id: &str) -> Option<(Self, &str)> {
        let (prefix, name) = asset_id.split_once('_')?;
        let kind = match prefix {
            "decoration" => Self::Decoration,
            "background" => Self::Background,
            _ => return None,
        };
        if name.is_empty() {
            return None;
        }
        Some((kind, name))
    }
}

/// A single entry of a `manifest.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub filename: String,
    #[serde(default = "default_unlock")]
    pub unlock: UnlockRequirement,
}

fn default_unlock() -> UnlockRequirement {
    UnlockRequirement::Free
}

impl ManifestEntry {
    /// Public URL the client uses to reference this asset.
    #[must_use]
    pub fn url(&self, kind: AssetKind) -> String {
        format!("/assets/{}/{}", kind.dir_name(), self.filename)
    }
}
