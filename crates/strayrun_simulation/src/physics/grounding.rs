//! Grounding/Falling подсистема
//!
//! Каждый кадр короткий probe вниз решает grounded; гистерезис поверх него —
//! falling. Ребро "начал падать": nav-агент выключается целиком (он не должен
//! бороться со свободным падением), тело переводится в dynamic. Ребро
//! "приземлился": velocity обнуляется, тело снова kinematic, а re-enable
//! агента откладывается ровно на один тик через `PendingNavRestore` —
//! компонент вставляется на кадре приземления, а потребляющая система стоит
//! РАНЬШЕ в цепочке и увидит его только на следующем кадре.
//!
//! Без `NavAgent` подсистема инертна: grounded продолжает считаться (для
//! анимации host'а), гравитационный override не включается.

use bevy::prelude::*;
use bevy_rapier3d::prelude::RigidBody;
use serde::{Deserialize, Serialize};

use crate::combat::Dead;
use crate::nav::{self, NavAgent, WorldSurface};
use crate::physics::body::PhysicsBody;

/// Производное состояние контакта с землёй
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct GroundState {
    /// Probe попал в землю на этом кадре
    pub grounded: bool,
    /// Гистерезисный взгляд на !grounded (не дёргает навигацию каждый кадр)
    pub falling: bool,
}

/// Параметры grounding/гравитации
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct GroundingConfig {
    /// Начало probe: чуть выше базы актора
    pub probe_offset: f32,
    /// Длина probe вниз
    pub probe_distance: f32,
    /// Добавочная гравитация при падении (доля от g)
    pub gravity_multiplier: f32,
    pub enable_gravity: bool,
    /// Радиус поиска навигируемой точки при re-snap после приземления
    pub resnap_radius: f32,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            probe_offset: 0.1,
            probe_distance: 0.3,
            gravity_multiplier: 2.0,
            enable_gravity: true,
            resnap_radius: 1.0,
        }
    }
}

/// Отложенное действие: восстановить навигацию на СЛЕДУЮЩЕМ тике
///
/// Вставляется на кадре приземления; `restore_navigation` стоит раньше по
/// цепочке и потребляет его кадром позже. Никаких корутин — очередь из одного
/// компонента, полностью синхронная и инспектируемая.
#[derive(Component, Debug, Default)]
pub struct PendingNavRestore;

/// Система: ground probe
///
/// Raycast вниз из точки чуть выше базы актора.
pub fn probe_ground(
    surface: Res<WorldSurface>,
    mut query: Query<(&GroundingConfig, &Transform, &mut GroundState)>,
) {
    for (config, transform, mut ground) in query.iter_mut() {
        let origin = transform.translation + Vec3::Y * config.probe_offset;
        ground.grounded = surface.raycast_down(origin, config.probe_distance).is_some();
    }
}

/// Система: гистерезис падения/приземления
pub fn apply_fall_transitions(
    mut commands: Commands,
    mut query: Query<(
        Entity,
        &GroundingConfig,
        &mut GroundState,
        &mut PhysicsBody,
        Option<&mut NavAgent>,
        Option<&mut RigidBody>,
    )>,
) {
    for (entity, config, mut ground, mut body, agent, rigid_body) in query.iter_mut() {
        // Без nav-агента подсистема инертна (grounded уже посчитан probe'ом)
        let Some(mut agent) = agent else {
            continue;
        };

        let should_fall = !ground.grounded && config.enable_gravity;

        if should_fall && !ground.falling {
            // Начало падения: агент выключен, тело в dynamic
            ground.falling = true;
            agent.enabled = false;
            agent.velocity = Vec3::ZERO;
            body.kinematic = false;
            body.use_gravity = true;
            if let Some(mut rigid_body) = rigid_body {
                *rigid_body = RigidBody::Dynamic;
            }
            crate::log(&format!("Entity {:?} started falling", entity));
        } else if !should_fall && ground.falling {
            // Приземление: тело останавливается и снова kinematic,
            // навигация вернётся через один тик
            ground.falling = false;
            body.velocity = Vec3::ZERO;
            body.angular_velocity = Vec3::ZERO;
            body.kinematic = true;
            if let Some(mut rigid_body) = rigid_body {
                *rigid_body = RigidBody::KinematicPositionBased;
            }
            commands.entity(entity).insert(PendingNavRestore);
            crate::log(&format!("Entity {:?} landed", entity));
        }
    }
}

/// Система: отложенное восстановление навигации (ровно тик после приземления)
///
/// Re-enable агента, re-snap на ближайшую навигируемую точку в малом радиусе
/// (warp), текущая позиция становится destination — устаревший путь отменён.
/// Если рядом поверхности нет — агент остаётся на месте и целится в себя.
pub fn restore_navigation(
    mut commands: Commands,
    surface: Res<WorldSurface>,
    mut pending: Query<
        (Entity, &GroundingConfig, &mut NavAgent, &mut Transform),
        (With<PendingNavRestore>, Without<Dead>),
    >,
) {
    for (entity, config, mut agent, mut transform) in pending.iter_mut() {
        agent.enabled = true;
        agent.is_stopped = false;

        if let Some(snapped) = surface.sample_navigable(transform.translation, config.resnap_radius)
        {
            nav::warp(&mut agent, &mut transform, snapped);
        } else {
            // Поверхность не нашлась: без паники, целимся в текущую позицию
            let here = transform.translation;
            agent.set_destination(here);
        }

        commands.entity(entity).remove::<PendingNavRestore>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounding_config_defaults() {
        let config = GroundingConfig::default();
        assert_eq!(config.probe_offset, 0.1);
        assert_eq!(config.probe_distance, 0.3);
        assert_eq!(config.gravity_multiplier, 2.0);
        assert!(config.enable_gravity);
    }

    #[test]
    fn test_falling_edge_logic() {
        // Гистерезис: переход в falling только с ребра !grounded
        let mut ground = GroundState::default();
        let enable_gravity = true;

        ground.grounded = false;
        let should_fall = !ground.grounded && enable_gravity;
        assert!(should_fall && !ground.falling); // ребро старта падения

        ground.falling = true;
        let should_fall = !ground.grounded && enable_gravity;
        assert!(should_fall && ground.falling); // уже падаем, ребра нет

        ground.grounded = true;
        let should_fall = !ground.grounded && enable_gravity;
        assert!(!should_fall && ground.falling); // ребро приземления
    }

    #[test]
    fn test_gravity_disabled_never_falls() {
        let ground = GroundState {
            grounded: false,
            falling: false,
        };
        let enable_gravity = false;
        assert!(!(!ground.grounded && enable_gravity));
    }
}
