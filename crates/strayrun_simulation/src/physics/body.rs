//! Физическое тело актора
//!
//! Наш velocity-state + флаги режима (kinematic / gravity). Rapier-компоненты
//! (RigidBody, Collider, LockedAxes) едут рядом на spawn'е для collision shape
//! и констрейнтов; интеграцию airborne тел делаем сами в FixedUpdate —
//! kinematic телами управляет nav-агент, не физика.

use bevy::prelude::*;

use crate::nav::WorldSurface;
use crate::physics::grounding::{GroundState, GroundingConfig};

/// Базовая гравитация движка (m/s²)
pub const GRAVITY: f32 = -9.81;

/// Состояние физического тела
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Kinematic: телом управляет nav-агент, гравитация не интегрируется
    pub kinematic: bool,
    /// Гравитация применяется только в dynamic-режиме
    pub use_gravity: bool,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            kinematic: true,
            use_gravity: true,
        }
    }
}

/// Система (FixedUpdate): гравитация падения
///
/// Базовая гравитация + добавочная сила с множителем из конфига — падение
/// быстрее дефолтного, один источник силы: g × (1 + multiplier).
pub fn apply_fall_gravity(
    mut query: Query<(&GroundingConfig, &GroundState, &mut PhysicsBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (config, ground, mut body) in query.iter_mut() {
        if !config.enable_gravity || body.kinematic || !body.use_gravity {
            continue;
        }
        if ground.grounded {
            continue;
        }
        body.velocity.y += GRAVITY * (1.0 + config.gravity_multiplier) * delta;
    }
}

/// Система (FixedUpdate): интеграция velocity → Transform для dynamic тел
///
/// Kinematic тела двигает nav-агент. Позиция не проваливается под землю:
/// ниже пола — прижимаем к полу (приземление увидит ground probe).
pub fn integrate_falling_bodies(
    surface: Res<WorldSurface>,
    mut query: Query<(&PhysicsBody, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, mut transform) in query.iter_mut() {
        if body.kinematic {
            continue;
        }
        transform.translation += body.velocity * delta;

        if let Some(floor) = surface.ground_height(transform.translation.x, transform.translation.z)
        {
            if transform.translation.y < floor {
                transform.translation.y = floor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_multiplier_scales_fall() {
        let config = GroundingConfig::default();
        let mut body = PhysicsBody {
            kinematic: false,
            ..Default::default()
        };

        let delta = 1.0 / 60.0;
        body.velocity.y += GRAVITY * (1.0 + config.gravity_multiplier) * delta;

        // multiplier 2.0 → суммарно 3g
        let expected = GRAVITY * 3.0 * delta;
        assert!((body.velocity.y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_kinematic_body_ignores_gravity() {
        let body = PhysicsBody::default();
        assert!(body.kinematic);
        // Guard из apply_fall_gravity: kinematic тело сила не трогает
        assert!(body.kinematic || !body.use_gravity);
    }
}
