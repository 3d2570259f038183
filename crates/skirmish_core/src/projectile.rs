//! Projectiles in flight.
//!
//! A projectile flies in a straight line toward a destination frozen at the
//! moment it was fired. It never homes. When it arrives it is marked dead and
//! the engine performs exactly one proximity damage check at that point.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};

/// Frame rate the projectile speeds are expressed against.
pub const REFERENCE_FRAME_RATE: i32 = 60;

/// Unique identifier for a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Visual and ballistic class of a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Small-arms fire.
    Bullet,
    /// Tank and turret shell.
    Shell,
    /// Infantry rocket.
    Rocket,
}

impl ProjectileKind {
    /// Pixels travelled per reference frame.
    #[must_use]
    pub const fn speed_per_frame(self) -> i32 {
        match self {
            Self::Bullet => 12,
            Self::Shell => 8,
            Self::Rocket => 6,
        }
    }

    /// Pixels travelled per second of simulated time.
    #[must_use]
    pub fn speed_per_second(self) -> Fixed {
        Fixed::from_num(self.speed_per_frame() * REFERENCE_FRAME_RATE)
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id.
    pub id: ProjectileId,
    /// Faction of the unit that fired it. Never damages this faction.
    pub faction: Faction,
    /// Projectile class.
    pub kind: ProjectileKind,
    /// Firing position.
    pub origin: Vec2Fixed,
    /// Current position.
    pub position: Vec2Fixed,
    /// Impact point, fixed at spawn.
    pub destination: Vec2Fixed,
    /// Damage before armor.
    pub damage: u32,
    /// Set on arrival.
    pub dead: bool,
}

impl Projectile {
    /// Create a projectile at `origin` aimed at `destination`.
    #[must_use]
    pub fn new(
        id: ProjectileId,
        faction: Faction,
        kind: ProjectileKind,
        origin: Vec2Fixed,
        destination: Vec2Fixed,
        damage: u32,
    ) -> Self {
        Self {
            id,
            faction,
            kind,
            origin,
            position: origin,
            destination,
            damage,
            dead: false,
        }
    }

    /// Distance covered in `dt` seconds.
    #[must_use]
    pub fn travel(&self, dt: Fixed) -> Fixed {
        self.kind.speed_per_second() * dt
    }

    /// Advance by one tick of `dt` seconds.
    ///
    /// If the remaining distance is shorter than this tick's travel the
    /// projectile snaps onto its destination and is marked dead. Returns
    /// `true` when it arrived this call.
    pub fn advance(&mut self, dt: Fixed) -> bool {
        if self.dead {
            return false;
        }

        let travel = self.travel(dt);
        let remaining = self.position.distance(self.destination);
        if remaining < travel {
            self.position = self.destination;
            self.dead = true;
            return true;
        }

        let direction = (self.destination - self.position).normalize();
        self.position = self.position + direction.scale(travel);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt_frame() -> Fixed {
        Fixed::ONE / Fixed::from_num(REFERENCE_FRAME_RATE)
    }

    fn bullet(from: Vec2Fixed, to: Vec2Fixed) -> Projectile {
        Projectile::new(
            ProjectileId(1),
            Faction::Coalition,
            ProjectileKind::Bullet,
            from,
            to,
            10,
        )
    }

    #[test]
    fn test_speeds_per_frame() {
        assert_eq!(ProjectileKind::Bullet.speed_per_frame(), 12);
        assert_eq!(ProjectileKind::Shell.speed_per_frame(), 8);
        assert_eq!(ProjectileKind::Rocket.speed_per_frame(), 6);
        assert_eq!(ProjectileKind::Rocket.speed_per_second(), Fixed::from_num(360));
    }

    #[test]
    fn test_advance_moves_along_line() {
        let mut p = bullet(Vec2Fixed::ZERO, Vec2Fixed::from_int(100, 0));
        assert!(!p.advance(Fixed::from_num(0.125)));
        // 12 px/frame * 60 * 0.125 s = 90 px
        assert_eq!(p.position, Vec2Fixed::from_int(90, 0));
        assert!(!p.dead);
    }

    #[test]
    fn test_advance_snaps_on_arrival() {
        let mut p = bullet(Vec2Fixed::ZERO, Vec2Fixed::from_int(20, 0));
        assert!(!p.advance(dt_frame()));
        assert!(p.advance(dt_frame()));
        assert_eq!(p.position, Vec2Fixed::from_int(20, 0));
        assert!(p.dead);
        assert!(!p.advance(dt_frame()));
    }

    #[test]
    fn test_zero_dt_does_not_move() {
        let mut p = bullet(Vec2Fixed::ZERO, Vec2Fixed::from_int(20, 0));
        assert!(!p.advance(Fixed::ZERO));
        assert_eq!(p.position, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_destination_is_frozen() {
        let target = Vec2Fixed::from_int(0, 30);
        let mut p = bullet(Vec2Fixed::ZERO, target);
        p.advance(dt_frame());
        assert_eq!(p.destination, target);
        assert_eq!(p.origin, Vec2Fixed::ZERO);
    }
}
