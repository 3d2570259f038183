//! Unit archetypes and their immutable stat blocks.
//!
//! Every unit in a mission is one of eight archetypes. The stat table is
//! compiled in: missions are hand-scripted and there is no tuning data to
//! load at runtime.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::projectile::ProjectileKind;

/// Extra pick radius, in pixels, for large archetypes.
pub const LARGE_HIT_PADDING: i32 = 8;

/// A fixed category of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Rifle infantry, fielded by both sides.
    Minigunner,
    /// Fast wheeled scout.
    Humvee,
    /// Main battle tank.
    MediumTank,
    /// Armored personnel carrier.
    Apc,
    /// Fast raider buggy.
    Buggy,
    /// Light tank.
    LightTank,
    /// Anti-armor rocket infantry.
    RocketInfantry,
    /// Static gun emplacement.
    Turret,
}

/// Immutable combat and movement stats of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchetypeStats {
    /// Maximum (and starting) health.
    pub max_health: u32,
    /// Movement speed in pixels per second.
    pub speed: Fixed,
    /// Engagement range in pixels.
    pub range: Fixed,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Seconds between shots.
    pub fire_interval: Fixed,
    /// Flat reduction applied to incoming projectile damage.
    pub armor: u32,
    /// Radius of the fog this unit lifts, in pixels.
    pub view_radius: Fixed,
}

/// Build a stat block from whole numbers; the fire interval is given in
/// milliseconds.
const fn stats(
    max_health: u32,
    speed: i32,
    range: i32,
    damage: u32,
    fire_interval_ms: i64,
    armor: u32,
    view_radius: i32,
) -> ArchetypeStats {
    ArchetypeStats {
        max_health,
        speed: Fixed::const_from_int(speed as i64),
        range: Fixed::const_from_int(range as i64),
        damage,
        // ms / 1000 as raw bits: (ms << 32) / 1000
        fire_interval: Fixed::from_bits((fire_interval_ms << 32) / 1000),
        armor,
        view_radius: Fixed::const_from_int(view_radius as i64),
    }
}

const MINIGUNNER: ArchetypeStats = stats(50, 42, 120, 8, 500, 0, 150);
const HUMVEE: ArchetypeStats = stats(150, 140, 160, 12, 600, 1, 220);
const MEDIUM_TANK: ArchetypeStats = stats(400, 77, 200, 40, 1500, 2, 180);
const APC: ArchetypeStats = stats(300, 123, 140, 10, 400, 3, 180);
const BUGGY: ArchetypeStats = stats(120, 158, 140, 10, 400, 1, 200);
const LIGHT_TANK: ArchetypeStats = stats(300, 98, 180, 30, 1200, 2, 180);
const ROCKET_INFANTRY: ArchetypeStats = stats(45, 35, 220, 25, 1000, 0, 160);
const TURRET: ArchetypeStats = stats(400, 0, 250, 50, 1600, 4, 250);

impl Archetype {
    /// All archetypes in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Minigunner,
        Self::Humvee,
        Self::MediumTank,
        Self::Apc,
        Self::Buggy,
        Self::LightTank,
        Self::RocketInfantry,
        Self::Turret,
    ];

    /// The archetype's stat block.
    #[must_use]
    pub const fn stats(self) -> &'static ArchetypeStats {
        match self {
            Self::Minigunner => &MINIGUNNER,
            Self::Humvee => &HUMVEE,
            Self::MediumTank => &MEDIUM_TANK,
            Self::Apc => &APC,
            Self::Buggy => &BUGGY,
            Self::LightTank => &LIGHT_TANK,
            Self::RocketInfantry => &ROCKET_INFANTRY,
            Self::Turret => &TURRET,
        }
    }

    /// Short lowercase name, used in logs and the headless runner.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minigunner => "minigunner",
            Self::Humvee => "humvee",
            Self::MediumTank => "medium_tank",
            Self::Apc => "apc",
            Self::Buggy => "buggy",
            Self::LightTank => "light_tank",
            Self::RocketInfantry => "rocket_infantry",
            Self::Turret => "turret",
        }
    }

    /// Which kind of projectile this archetype fires.
    #[must_use]
    pub const fn projectile_kind(self) -> ProjectileKind {
        match self {
            Self::RocketInfantry => ProjectileKind::Rocket,
            Self::MediumTank | Self::LightTank | Self::Turret => ProjectileKind::Shell,
            _ => ProjectileKind::Bullet,
        }
    }

    /// Whether the archetype gets an enlarged pick circle.
    #[must_use]
    pub const fn is_large(self) -> bool {
        matches!(
            self,
            Self::MediumTank | Self::Apc | Self::LightTank | Self::Turret
        )
    }

    /// Pick radius for this archetype given the base click radius.
    #[must_use]
    pub fn hit_radius(self, base: Fixed) -> Fixed {
        if self.is_large() {
            base + Fixed::from_num(LARGE_HIT_PADDING)
        } else {
            base
        }
    }

    /// Whether the archetype can move at all.
    #[must_use]
    pub fn is_mobile(self) -> bool {
        self.stats().speed > Fixed::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_table_values() {
        let tank = Archetype::MediumTank.stats();
        assert_eq!(tank.max_health, 400);
        assert_eq!(tank.damage, 40);
        assert_eq!(tank.armor, 2);
        assert_eq!(tank.range, Fixed::from_num(200));
        assert_eq!(tank.fire_interval, Fixed::from_num(1.5));

        let turret = Archetype::Turret.stats();
        assert_eq!(turret.armor, 4);
        assert_eq!(turret.speed, Fixed::ZERO);
    }

    #[test]
    fn test_fire_interval_conversion() {
        assert_eq!(Archetype::Minigunner.stats().fire_interval, Fixed::from_num(0.5));
        assert_eq!(Archetype::RocketInfantry.stats().fire_interval, Fixed::ONE);
        let apc = Archetype::Apc.stats().fire_interval;
        assert!((apc - Fixed::from_num(0.4)).abs() < Fixed::from_num(0.000_001));
    }

    #[test]
    fn test_projectile_kinds() {
        assert_eq!(
            Archetype::RocketInfantry.projectile_kind(),
            ProjectileKind::Rocket
        );
        assert_eq!(Archetype::MediumTank.projectile_kind(), ProjectileKind::Shell);
        assert_eq!(Archetype::LightTank.projectile_kind(), ProjectileKind::Shell);
        assert_eq!(Archetype::Turret.projectile_kind(), ProjectileKind::Shell);
        assert_eq!(Archetype::Humvee.projectile_kind(), ProjectileKind::Bullet);
        assert_eq!(Archetype::Minigunner.projectile_kind(), ProjectileKind::Bullet);
    }

    #[test]
    fn test_hit_radius_enlarged_for_large_archetypes() {
        let base = Fixed::from_num(20);
        assert_eq!(Archetype::Minigunner.hit_radius(base), base);
        assert_eq!(Archetype::MediumTank.hit_radius(base), Fixed::from_num(28));
        assert_eq!(Archetype::Turret.hit_radius(base), Fixed::from_num(28));
    }

    #[test]
    fn test_only_turret_is_static() {
        for archetype in Archetype::ALL {
            assert_eq!(archetype.is_mobile(), archetype != Archetype::Turret);
        }
    }
}
