//! Collision groups — централизованные константы слоёв
//!
//! - Layer 2: Actors (капсулы NPC/игрока)
//! - Layer 3: Environment (статическая геометрия host'а)
//! - Layer 4: Projectiles (sensor-коллайдеры снарядов)
//! - Layer 5: Weapons (sensor-hitbox'ы melee оружия)

use bevy_rapier3d::prelude::{CollisionGroups, Group};

pub const GROUP_ACTORS: Group = Group::GROUP_2;
pub const GROUP_ENVIRONMENT: Group = Group::GROUP_3;
pub const GROUP_PROJECTILES: Group = Group::GROUP_4;
pub const GROUP_WEAPONS: Group = Group::GROUP_5;

/// Акторы коллайдят с акторами и окружением
pub fn actor_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_ACTORS, GROUP_ACTORS.union(GROUP_ENVIRONMENT))
}

/// Melee hitbox детектирует только акторов
pub fn weapon_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_WEAPONS, GROUP_ACTORS)
}

/// Снаряды детектируют акторов и окружение, но не друг друга
pub fn projectile_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PROJECTILES, GROUP_ACTORS.union(GROUP_ENVIRONMENT))
}
