//! Combat module — реестр урона/cooldown'ов, контакты, смерть, hit flash
//!
//! ECS ответственность:
//! - Game state: Health, карта cooldown'ов, flash-флаг
//! - Combat rules: два пути контакта (melee через родителя, снаряд напрямую),
//!   асимметрия клампа NPC/игрок, смерть в том же вызове что и урон
//! - События: WeaponContact → InflictDamage → DamageDealt / EntityDied
//!
//! Host ответственность: анимация замаха, настоящие contact-события физики,
//! покраска поверхностей по `HitFlash`, lifecycle снарядов.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, Sensor};

use crate::components::{DamageSource, ProjectileDamage};
use crate::physics::collision;
use crate::SimSet;

pub mod contact;
pub mod damage;
pub mod melee;

// Re-export основных типов
pub use contact::{detect_weapon_contacts, sync_weapon_hitboxes, WeaponHitbox};
pub use damage::{
    apply_inflicted_damage, despawn_after_timeout, tick_hit_flash, trigger_hit_flash, DamageDealt,
    Dead, DespawnAfter, EntityDied, HitFlash, InflictDamage,
};
pub use melee::{resolve_weapon_contacts, MeleeConfig, MeleeCooldowns, WeaponContact};

/// Combat Plugin
///
/// Порядок выполнения (chain в SimSet::Contacts, конец кадра — следующий
/// per-frame тик уже видит применённый урон и взведённые cooldown'ы):
/// 1. tick_hit_flash — flash-таймеры
/// 2. sync_weapon_hitboxes — hitbox'ы к носителям
/// 3. detect_weapon_contacts — перекрытия → WeaponContact
/// 4. resolve_weapon_contacts — реестр (cooldown'ы, capability) → InflictDamage
/// 5. apply_inflicted_damage — Health, flash, смерть
/// 6. despawn_after_timeout — трупы по таймеру
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WeaponContact>()
            .add_event::<InflictDamage>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_systems(
                Update,
                (
                    tick_hit_flash,
                    sync_weapon_hitboxes,
                    detect_weapon_contacts,
                    resolve_weapon_contacts,
                    apply_inflicted_damage,
                    despawn_after_timeout,
                )
                    .chain()
                    .in_set(SimSet::Contacts),
            );
    }
}

/// Spawn helper: melee-оружие у носителя
///
/// Носитель получает damage capability, hitbox — дочерний sensor-коллайдер.
pub fn spawn_melee_weapon(
    commands: &mut Commands,
    wielder: Entity,
    damage: f32,
    radius: f32,
) -> Entity {
    commands.entity(wielder).insert(DamageSource { damage });
    commands
        .spawn((
            WeaponHitbox { radius },
            Transform::default(),
            ChildOf(wielder),
            Collider::ball(radius),
            Sensor,
            collision::weapon_groups(),
        ))
        .id()
}

/// Spawn helper: снаряд (capability на самом коллайдере)
pub fn spawn_projectile(
    commands: &mut Commands,
    position: Vec3,
    damage: f32,
    radius: f32,
) -> Entity {
    commands
        .spawn((
            ProjectileDamage { damage },
            WeaponHitbox { radius },
            Transform::from_translation(position),
            Collider::ball(radius),
            Sensor,
            collision::projectile_groups(),
        ))
        .id()
}
