//! Базовые ECS компоненты симуляции
//!
//! Health в f32: NPC-вариант урона НЕ клампит здоровье снизу — отрицательное
//! значение наблюдаемо ровно один момент перед проверкой смерти (проверка идёт
//! сразу за вычитанием). Player-вариант клампит в [0, max]. Асимметрия
//! сохранена намеренно, см. DESIGN.md.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Здоровье актора
///
/// Инвариант: current ≤ max; ниже нуля — только транзиентно (NPC-вариант).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// NPC-вариант: вычитание без нижнего клампа
    pub fn take_damage(&mut self, amount: f32) {
        self.current -= amount;
    }

    /// Player-вариант: кламп в [0, max]
    pub fn take_damage_clamped(&mut self, amount: f32) {
        self.current = (self.current - amount).clamp(0.0, self.max);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Маркер игрока — combat target для NPC
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Damage capability владельца melee-оружия
///
/// Явный полиморфный интерфейс вместо рефлексии по полям: компонент на
/// entity-носителе оружия, hitbox-коллайдеры — его дочерние entity (`ChildOf`).
/// Реестр урона читает capability у логического атакующего (родителя коллайдера).
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct DamageSource {
    pub damage: f32,
}

impl Default for DamageSource {
    fn default() -> Self {
        Self { damage: 20.0 }
    }
}

/// Damage capability снаряда — на самом коллайдере, не на родителе
///
/// Второй, независимый путь контакта: урон применяется безусловно на каждый
/// контакт, без cooldown (снаряд одноразовый, его lifecycle — у внешнего
/// collaborator'а).
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct ProjectileDamage {
    pub damage: f32,
}

impl Default for ProjectileDamage {
    fn default() -> Self {
        Self { damage: 10.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npc_damage_goes_negative() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        assert_eq!(health.current, 70.0);
        assert!(health.is_alive());

        // NPC-вариант: транзиентный минус наблюдаем
        health.take_damage(100.0);
        assert_eq!(health.current, -30.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_player_damage_clamped() {
        let mut health = Health::new(100.0);
        health.take_damage_clamped(30.0);
        assert_eq!(health.current, 70.0);

        health.take_damage_clamped(100.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_heal_clamped_to_max() {
        let mut health = Health::new(100.0);
        health.take_damage_clamped(50.0);
        health.heal(30.0);
        assert_eq!(health.current, 80.0);

        health.heal(100.0);
        assert_eq!(health.current, 100.0);
    }
}
