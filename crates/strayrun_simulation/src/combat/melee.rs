//! Реестр melee-урона с per-attacker cooldown'ами
//!
//! Контакт оружия сам по себе урона не наносит — реестр решает. Логический
//! атакующий = родитель коллайдера (entity-носитель оружия), его damage
//! capability — компонент `DamageSource`. Нет capability — контакт молча
//! игнорируется: произвольные реализации оружия подключаются одним
//! компонентом, без общего типа оружия.
//!
//! Cooldown — карта "атакующий → абсолютный момент истечения". Записи
//! создаются лениво при первом попадании и не вычищаются (истёкшие просто
//! игнорируются; рост ограничен числом различных атакующих). Длительный
//! контакт (клинок прижат к NPC) тикает урон с фиксированной частотой —
//! один глобальный cooldown на противника, не debounce по событиям.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::damage::InflictDamage;
use crate::components::{DamageSource, ProjectileDamage};
use crate::npc::behavior::Npc;

/// Параметры реестра урона NPC
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct MeleeConfig {
    /// Cooldown одного атакующего против этого NPC (секунды)
    pub cooldown_duration: f32,
    /// Длительность hit flash (секунды)
    pub hit_flash_duration: f32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            cooldown_duration: 0.5,
            hit_flash_duration: 0.2,
        }
    }
}

/// Карта cooldown'ов атакующих; владеет исключительно этот NPC
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct MeleeCooldowns {
    /// Атакующий → абсолютный момент истечения cooldown'а
    pub expiry: HashMap<Entity, f32>,
}

impl MeleeCooldowns {
    /// Готов ли атакующий нанести урон в момент `now`
    pub fn ready(&self, attacker: Entity, now: f32) -> bool {
        self.expiry.get(&attacker).map_or(true, |&until| now >= until)
    }

    /// Взвести cooldown атакующего до момента `until`
    pub fn arm(&mut self, attacker: Entity, until: f32) {
        self.expiry.insert(attacker, until);
    }
}

/// Событие контакта от physics collaborator'а
///
/// `collider` — непосредственный коллайдер (hitbox оружия или снаряд),
/// `target` — NPC, которого задели.
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponContact {
    pub collider: Entity,
    pub target: Entity,
}

/// Система: резолв контактов оружия → команды урона
///
/// Два независимых пути:
/// 1. Снаряд: `ProjectileDamage` на самом коллайдере → урон безусловно,
///    без cooldown (одноразовость обеспечивает его собственный collaborator).
/// 2. Melee: родитель коллайдера с `DamageSource` → урон через per-attacker
///    cooldown; нет родителя или capability — контакт молча игнорируется,
///    cooldown НЕ взводится.
pub fn resolve_weapon_contacts(
    time: Res<Time>,
    mut contacts: EventReader<WeaponContact>,
    mut npcs: Query<(&MeleeConfig, &mut MeleeCooldowns), With<Npc>>,
    projectiles: Query<&ProjectileDamage>,
    parents: Query<&ChildOf>,
    capabilities: Query<&DamageSource>,
    mut inflict: EventWriter<InflictDamage>,
) {
    let now = time.elapsed_secs();

    for contact in contacts.read() {
        // Путь 1: снаряд несёт урон сам
        if let Ok(projectile) = projectiles.get(contact.collider) {
            inflict.write(InflictDamage {
                target: contact.target,
                amount: projectile.damage,
                source: Some(contact.collider),
            });
            continue;
        }

        // Путь 2: melee через родителя коллайдера
        let Ok((config, mut cooldowns)) = npcs.get_mut(contact.target) else {
            continue;
        };
        let Ok(child_of) = parents.get(contact.collider) else {
            continue;
        };
        let attacker = child_of.parent();

        if !cooldowns.ready(attacker, now) {
            continue;
        }
        let Ok(source) = capabilities.get(attacker) else {
            // Нет damage capability — не урон и не cooldown
            continue;
        };

        inflict.write(InflictDamage {
            target: contact.target,
            amount: source.damage,
            source: Some(attacker),
        });
        cooldowns.arm(attacker, now + config.cooldown_duration);
    }
}
