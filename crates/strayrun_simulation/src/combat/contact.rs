//! Детекция контактов оружия (stand-in physics collaborator'а)
//!
//! Sensor-hitbox'ы оружия сверяются с позициями живых NPC простой sphere
//! check'ой; перекрытие на кадре → событие `WeaponContact`. Перекрытие,
//! длящееся несколько кадров, генерирует событие каждый кадр — фиксированную
//! частоту урона из этого делает per-attacker cooldown реестра.
//!
//! Host с настоящей физикой заменяет эту систему своими contact-событиями;
//! контракт `WeaponContact` не меняется.

use bevy::prelude::*;
use bevy_rapier3d::prelude::ColliderDisabled;

use crate::combat::melee::WeaponContact;
use crate::components::Health;
use crate::npc::behavior::Npc;

/// Sensor-hitbox оружия или снаряда
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct WeaponHitbox {
    /// Радиус сферы контакта (метры)
    pub radius: f32,
}

impl Default for WeaponHitbox {
    fn default() -> Self {
        Self { radius: 1.5 }
    }
}

/// Система: hitbox'ы следуют за носителем
///
/// Stand-in крепления к руке: hitbox с родителем копирует его позицию.
/// Снаряды (без `ChildOf`) двигает их собственный collaborator.
pub fn sync_weapon_hitboxes(
    mut hitboxes: Query<(&ChildOf, &mut Transform), With<WeaponHitbox>>,
    wielders: Query<&Transform, Without<WeaponHitbox>>,
) {
    for (child_of, mut transform) in hitboxes.iter_mut() {
        if let Ok(wielder_transform) = wielders.get(child_of.parent()) {
            transform.translation = wielder_transform.translation;
        }
    }
}

/// Система: детекция перекрытий hitbox ↔ NPC
///
/// Трупы с отключённым hit-коллайдером не задеваются; собственный носитель
/// оружия — тоже.
pub fn detect_weapon_contacts(
    hitboxes: Query<(Entity, &WeaponHitbox, &Transform)>,
    targets: Query<(Entity, &Transform), (With<Npc>, With<Health>, Without<ColliderDisabled>)>,
    parents: Query<&ChildOf>,
    mut contacts: EventWriter<WeaponContact>,
) {
    for (hitbox_entity, hitbox, hitbox_transform) in hitboxes.iter() {
        let origin = hitbox_transform.translation;

        for (target, target_transform) in targets.iter() {
            // Не задеваем владельца оружия
            if let Ok(child_of) = parents.get(hitbox_entity) {
                if child_of.parent() == target {
                    continue;
                }
            }

            if origin.distance(target_transform.translation) < hitbox.radius {
                contacts.write(WeaponContact {
                    collider: hitbox_entity,
                    target,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_distance_check() {
        let hitbox_pos = Vec3::ZERO;
        let radius = 1.5;

        let near = Vec3::new(1.0, 0.0, 0.0);
        let far = Vec3::new(2.0, 0.0, 0.0);

        assert!(hitbox_pos.distance(near) < radius);
        assert!(hitbox_pos.distance(far) >= radius);
    }
}
