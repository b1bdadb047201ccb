//! Common spatial components shared by every entity type.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// 2D vector in grid-local space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Axis-aligned bounding box in grid-local space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box of the given half extents centred on `center`
    pub fn centered(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Strict overlap test. Boxes that only share an edge do not intersect,
    /// so an item on the neighbouring tile is not "on" a pallet.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Spatial transform - parent link, anchoring and local placement.
///
/// The parent is either a grid (the entity rests on the deck) or another
/// entity (the entity is contained, e.g. inside a crate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub parent: Option<Entity>,
    pub anchored: bool,
    pub local_position: Vec2,
    /// Radians
    pub local_rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            parent: None,
            anchored: false,
            local_position: Vec2::ZERO,
            local_rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn new(parent: Entity, x: f32, y: f32) -> Self {
        Self {
            parent: Some(parent),
            local_position: Vec2::new(x, y),
            ..Default::default()
        }
    }

    /// Entity held inside another entity
    pub fn contained_in(container: Entity) -> Self {
        Self {
            parent: Some(container),
            ..Default::default()
        }
    }

    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }
}

/// Physical footprint of an entity, as half extents around its position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Fixture {
    pub half_extents: Vec2,
}

impl Fixture {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// One full tile
    pub fn tile() -> Self {
        Self::new(1.0, 1.0)
    }

    /// Bounds of this footprint placed at `position` and rotated by `rotation`
    pub fn bounds_at(&self, position: Vec2, rotation: f32) -> Aabb {
        let (sin, cos) = rotation.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let extents = Vec2::new(
            cos * self.half_extents.x + sin * self.half_extents.y,
            sin * self.half_extents.x + cos * self.half_extents.y,
        );
        Aabb::centered(position, extents)
    }
}

/// Which spatial lookup bucket an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupCategory {
    /// Walls, floors, machines bolted to the deck
    Static,
    /// Physics-driven things that move: items, crates, mobs
    Dynamic,
    /// Small non-colliding things (paper, cigarette butts)
    Sundries,
}

impl LookupCategory {
    pub fn flag(&self) -> LookupFlags {
        match self {
            LookupCategory::Static => LookupFlags::STATIC,
            LookupCategory::Dynamic => LookupFlags::DYNAMIC,
            LookupCategory::Sundries => LookupFlags::SUNDRIES,
        }
    }
}

/// Bit set of lookup categories for intersection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LookupFlags(u8);

impl LookupFlags {
    pub const NONE: Self = Self(0);
    pub const STATIC: Self = Self(1);
    pub const DYNAMIC: Self = Self(1 << 1);
    pub const SUNDRIES: Self = Self(1 << 2);

    pub fn contains(&self, other: LookupFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for LookupFlags {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Human-readable entity name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec2::new(5.0, 8.0));
        assert_eq!(b - a, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_aabb_intersects_is_strict() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(1.0));
        let overlapping = Aabb::new(Vec2::splat(0.5), Vec2::splat(1.5));
        let touching = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));

        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_fixture_rotation_swaps_extents() {
        let fixture = Fixture::new(2.0, 1.0);
        let bounds = fixture.bounds_at(Vec2::ZERO, std::f32::consts::FRAC_PI_2);

        assert!((bounds.width() - 1.0).abs() < 0.001);
        assert!((bounds.height() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_lookup_flags() {
        let flags = LookupFlags::DYNAMIC | LookupFlags::SUNDRIES;
        assert!(flags.contains(LookupFlags::DYNAMIC));
        assert!(flags.contains(LookupCategory::Sundries.flag()));
        assert!(!flags.contains(LookupFlags::STATIC));
        assert!(!flags.contains(LookupFlags::NONE));
    }
}
