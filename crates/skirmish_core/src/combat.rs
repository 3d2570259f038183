//! Flat-armor damage and projectile impact resolution.
//!
//! Damage model:
//! ```text
//! Final Damage = max(MIN_DAMAGE, Projectile Damage - Target Armor)
//! ```
//!
//! A projectile resolves exactly once, at the point where it landed. The
//! first unit in roster order that is inside the impact circle and belongs
//! to a different faction takes the hit. Friendly units in the circle are
//! skipped, not absorbed.

use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::{Unit, UnitId};

/// Minimum damage any hit deals.
pub const MIN_DAMAGE: u32 = 1;

/// Impact radius in pixels.
pub const IMPACT_RADIUS: i32 = 20;

/// Squared impact radius (strict bound).
#[must_use]
pub fn impact_radius_squared() -> Fixed {
    Fixed::from_num(IMPACT_RADIUS * IMPACT_RADIUS)
}

/// Damage after flat armor reduction, never below [`MIN_DAMAGE`].
#[must_use]
pub const fn impact_damage(damage: u32, armor: u32) -> u32 {
    let reduced = damage.saturating_sub(armor);
    if reduced < MIN_DAMAGE {
        MIN_DAMAGE
    } else {
        reduced
    }
}

/// Outcome of a projectile landing on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    /// Roster index of the unit hit.
    pub index: usize,
    /// Id of the unit hit.
    pub victim: UnitId,
    /// Damage after armor.
    pub damage: u32,
}

/// Find the unit a projectile lands on.
///
/// Scans `units` in order and returns the first live unit of another faction
/// strictly inside the impact circle around `point`.
#[must_use]
pub fn resolve_impact(
    units: &[Unit],
    point: Vec2Fixed,
    faction: Faction,
    damage: u32,
) -> Option<Impact> {
    let radius_sq = impact_radius_squared();
    units
        .iter()
        .enumerate()
        .find(|(_, unit)| {
            unit.is_alive()
                && unit.faction != faction
                && unit.position.distance_squared(point) < radius_sq
        })
        .map(|(index, unit)| Impact {
            index,
            victim: unit.id,
            damage: impact_damage(damage, unit.stats().armor),
        })
}
