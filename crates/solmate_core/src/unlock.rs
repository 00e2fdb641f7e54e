//! Cosmetic unlock rules.

use solmate_data::{AssetKind, ManifestEntry, UnlockRequirement};
use std::collections::HashSet;

/// What a creature has earned or bought, as seen by unlock checks.
#[derive(Debug, Clone, Default)]
pub struct Entitlements {
    pub level: u32,
    pub purchased: HashSet<String>,
}

impl Entitlements {
    #[must_use]
    pub fn new(level: u32, purchased: impl IntoIterator<Item = String>) -> Self {
        Self {
            level,
            purchased: purchased.into_iter().collect(),
        }
    }

    /// Entitlements of a visitor with no creature.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(0, std::iter::empty())
    }

    #[must_use]
    pub fn allows(&self, kind: AssetKind, entry: &ManifestEntry) -> bool {
        match &entry.unlock {
            UnlockRequirement::Free => true,
            UnlockRequirement::Level { level } => self.level >= *level,
            UnlockRequirement::Paid { .. } => {
                self.purchased.contains(&kind.asset_id(&entry.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, unlock: UnlockRequirement) -> ManifestEntry {
        ManifestEntry {
            name: name.into(),
            filename: format!("{name}.png"),
            unlock,
        }
    }

    #[test]
    fn test_free_always_allowed() {
        let e = entry("grass", UnlockRequirement::Free);
        assert!(Entitlements::anonymous().allows(AssetKind::Background, &e));
    }

    #[test]
    fn test_level_gate() {
        let e = entry("castle", UnlockRequirement::Level { level: 5 });
        assert!(!Entitlements::new(4, []).allows(AssetKind::Decoration, &e));
        assert!(Entitlements::new(5, []).allows(AssetKind::Decoration, &e));
    }

    #[test]
    fn test_paid_needs_matching_purchase() {
        let e = entry("gold", UnlockRequirement::Paid { amount: 0.5 });
        let owner = Entitlements::new(1, ["background_gold".to_string()]);
        assert!(owner.allows(AssetKind::Background, &e));
        assert!(!owner.allows(AssetKind::Decoration, &e));
        assert!(!Entitlements::new(99, []).allows(AssetKind::Background, &e));
    }
}
