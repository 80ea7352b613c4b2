//! Fragile material classification

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;
use super::voxel::MaterialId;

/// The sixteen dye colors of stained glass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlassColor {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
}

impl GlassColor {
    pub const ALL: [GlassColor; 16] = [
        GlassColor::White,
        GlassColor::Orange,
        GlassColor::Magenta,
        GlassColor::LightBlue,
        GlassColor::Yellow,
        GlassColor::Lime,
        GlassColor::Pink,
        GlassColor::Gray,
        GlassColor::LightGray,
        GlassColor::Cyan,
        GlassColor::Purple,
        GlassColor::Blue,
        GlassColor::Brown,
        GlassColor::Green,
        GlassColor::Red,
        GlassColor::Black,
    ];
}

/// Breakable material subtype.
///
/// Two voxels belong to the same structure only when their kinds are equal,
/// so a red pane never merges with a blue one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragileKind {
    Glass,
    Pane,
    Stained(GlassColor),
    StainedPane(GlassColor),
    Tinted,
}

/// Kinds sharing one regeneration delay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KindFamily {
    Glass,
    Pane,
    Stained,
    StainedPane,
    Tinted,
}

impl FragileKind {
    pub fn family(&self) -> KindFamily {
        match self {
            FragileKind::Glass => KindFamily::Glass,
            FragileKind::Pane => KindFamily::Pane,
            FragileKind::Stained(_) => KindFamily::Stained,
            FragileKind::StainedPane(_) => KindFamily::StainedPane,
            FragileKind::Tinted => KindFamily::Tinted,
        }
    }

    /// Whether two kinds may be merged into one structure
    pub fn merges_with(&self, other: &FragileKind) -> bool {
        self == other
    }
}

/// Default host palette ids for the fragile materials.
pub mod palette {
    use super::{FragileKind, GlassColor, MaterialId};

    pub const GLASS: MaterialId = 20;
    pub const GLASS_PANE: MaterialId = 102;
    pub const TINTED_GLASS: MaterialId = 130;
    /// First of 16 consecutive stained glass ids, in [`GlassColor::ALL`] order
    pub const STAINED_GLASS_BASE: MaterialId = 200;
    /// First of 16 consecutive stained pane ids, in [`GlassColor::ALL`] order
    pub const STAINED_PANE_BASE: MaterialId = 220;

    pub fn stained_glass(color: GlassColor) -> MaterialId {
        STAINED_GLASS_BASE + color_index(color)
    }

    pub fn stained_pane(color: GlassColor) -> MaterialId {
        STAINED_PANE_BASE + color_index(color)
    }

    fn color_index(color: GlassColor) -> MaterialId {
        GlassColor::ALL.iter().position(|&c| c == color).unwrap_or(0) as MaterialId
    }

    /// Every default palette entry
    pub fn default_entries() -> Vec<(MaterialId, FragileKind)> {
        let mut entries = vec![
            (GLASS, FragileKind::Glass),
            (GLASS_PANE, FragileKind::Pane),
            (TINTED_GLASS, FragileKind::Tinted),
        ];
        for color in GlassColor::ALL {
            entries.push((stained_glass(color), FragileKind::Stained(color)));
            entries.push((stained_pane(color), FragileKind::StainedPane(color)));
        }
        entries
    }
}

/// Regeneration delay per kind family, in ticks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FamilyDelays {
    pub glass: Tick,
    pub pane: Tick,
    pub stained: Tick,
    pub stained_pane: Tick,
    pub tinted: Tick,
}

impl FamilyDelays {
    pub fn get(&self, family: KindFamily) -> Tick {
        match family {
            KindFamily::Glass => self.glass,
            KindFamily::Pane => self.pane,
            KindFamily::Stained => self.stained,
            KindFamily::StainedPane => self.stained_pane,
            KindFamily::Tinted => self.tinted,
        }
    }
}

/// Fixed lookup table from material id to fragile kind.
///
/// Built once from configuration; lookups are pure.
#[derive(Clone, Debug)]
pub struct MaterialRegistry {
    kinds: HashMap<MaterialId, FragileKind>,
    delays: FamilyDelays,
}

impl MaterialRegistry {
    /// Build a registry from explicit palette entries
    pub fn new(entries: impl IntoIterator<Item = (MaterialId, FragileKind)>, delays: FamilyDelays) -> Self {
        Self {
            kinds: entries.into_iter().collect(),
            delays,
        }
    }

    /// Registry over the default palette
    pub fn with_default_palette(delays: FamilyDelays) -> Self {
        Self::new(palette::default_entries(), delays)
    }

    /// Classify a material, or None if it is not fragile
    pub fn classify(&self, material_id: MaterialId) -> Option<FragileKind> {
        self.kinds.get(&material_id).copied()
    }

    pub fn is_fragile(&self, material_id: MaterialId) -> bool {
        self.classify(material_id).is_some()
    }

    /// Base regeneration delay for a kind
    pub fn regen_delay(&self, kind: FragileKind) -> Tick {
        self.delays.get(kind.family())
    }

    /// Number of registered fragile materials
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delays() -> FamilyDelays {
        FamilyDelays { glass: 600, pane: 500, stained: 700, stained_pane: 600, tinted: 800 }
    }

    #[test]
    fn test_default_palette() {
        let reg = MaterialRegistry::with_default_palette(delays());
        assert_eq!(reg.len(), 3 + 32);
        assert_eq!(reg.classify(palette::GLASS), Some(FragileKind::Glass));
        assert_eq!(
            reg.classify(palette::stained_pane(GlassColor::Red)),
            Some(FragileKind::StainedPane(GlassColor::Red))
        );
        assert!(!reg.is_fragile(1));
        assert!(!reg.is_fragile(0));
    }

    #[test]
    fn test_regen_delay_by_family() {
        let reg = MaterialRegistry::with_default_palette(delays());
        assert_eq!(reg.regen_delay(FragileKind::Glass), 600);
        assert_eq!(reg.regen_delay(FragileKind::Stained(GlassColor::Blue)), 700);
        assert_eq!(reg.regen_delay(FragileKind::Tinted), 800);
    }

    #[test]
    fn test_colors_do_not_merge() {
        let red = FragileKind::Stained(GlassColor::Red);
        let blue = FragileKind::Stained(GlassColor::Blue);
        assert!(red.merges_with(&red));
        assert!(!red.merges_with(&blue));
        assert!(!FragileKind::Glass.merges_with(&FragileKind::Pane));
    }
}
