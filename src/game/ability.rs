//! Signs, abilities and the combo table that maps one to the other

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A gesture label produced by the external classifier.
///
/// Labels are opaque: they are only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sign(String);

impl Sign {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Sign {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abilities a player can cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Fast projectile, cancelled by an opposing water ball
    Fireball,
    /// Short-lived barrier that absorbs one projectile
    Wall,
    /// Slow, heavy projectile
    HeavyAttack,
    /// Fast projectile, cancelled by an opposing fireball
    WaterBall,
}

impl Ability {
    pub const COUNT: usize = 4;
    pub const ALL: [Ability; Self::COUNT] = [
        Ability::Fireball,
        Ability::Wall,
        Ability::HeavyAttack,
        Ability::WaterBall,
    ];

    /// Slot in per-ability arrays
    pub fn index(self) -> usize {
        match self {
            Self::Fireball => 0,
            Self::Wall => 1,
            Self::HeavyAttack => 2,
            Self::WaterBall => 3,
        }
    }

    /// Cooldown after a successful cast (seconds)
    pub fn cooldown(self) -> f32 {
        match self {
            Self::Fireball => 1.0,
            Self::Wall => 3.0,
            Self::HeavyAttack => 5.0,
            Self::WaterBall => 1.0,
        }
    }

    /// Whether casting spawns a projectile (as opposed to a wall)
    pub fn is_projectile(self) -> bool {
        !matches!(self, Self::Wall)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fireball => "fireball",
            Self::Wall => "wall",
            Self::HeavyAttack => "heavy_attack",
            Self::WaterBall => "water_ball",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

/// Ordered sign sequences that trigger abilities.
///
/// Matching tries longer combos first. Two combos of equal length can only
/// both match the same suffix if they are identical, which construction
/// rejects, so the order within a length never decides a match.
#[derive(Debug, Clone)]
pub struct ComboTable {
    /// Sorted by descending length, declaration order kept within a length
    entries: Vec<(Ability, Vec<Sign>)>,
}

impl ComboTable {
    /// Build a table, rejecting empty combos and combos shared by two abilities
    pub fn new(combos: Vec<(Ability, Vec<Sign>)>) -> Result<Self, ConfigError> {
        for (i, (ability, signs)) in combos.iter().enumerate() {
            if signs.is_empty() {
                return Err(ConfigError::EmptyCombo(*ability));
            }
            if let Some((other, _)) = combos[..i].iter().find(|(_, s)| s == signs) {
                return Err(ConfigError::DuplicateCombo(*other, *ability));
            }
        }

        let mut entries = combos;
        // Stable sort keeps declaration order between equal lengths
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        Ok(Self { entries })
    }

    /// Find the ability whose combo is a suffix of `sequence`
    pub fn match_suffix(&self, sequence: &[Sign]) -> Option<Ability> {
        self.entries
            .iter()
            .find(|(_, combo)| sequence.ends_with(combo))
            .map(|(ability, _)| *ability)
    }

    pub fn combo_for(&self, ability: Ability) -> Option<&[Sign]> {
        self.entries
            .iter()
            .find(|(a, _)| *a == ability)
            .map(|(_, combo)| combo.as_slice())
    }

    /// Longest registered combo
    pub fn max_len(&self) -> usize {
        self.entries.first().map(|(_, c)| c.len()).unwrap_or(0)
    }
}

impl Default for ComboTable {
    fn default() -> Self {
        let combo = |signs: &[&str]| signs.iter().map(|s| Sign::from(*s)).collect::<Vec<_>>();
        Self {
            entries: vec![
                (Ability::Wall, combo(&["hare", "snake"])),
                (Ability::Fireball, combo(&["snake", "ram"])),
                (Ability::HeavyAttack, combo(&["dragon", "dog"])),
                (Ability::WaterBall, combo(&["hare", "ram"])),
            ],
        }
    }
}
