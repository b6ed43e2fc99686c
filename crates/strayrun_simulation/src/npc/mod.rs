//! NPC module — контроллер поведения, активация, анимационный intent
//!
//! Композиция (leaves first): grounding/падение решается раньше по кадру
//! (physics module), FSM оценивается только на земле, навигационные команды
//! уходят в `NavAgent`, урон/cooldown — в combat module.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, LockedAxes, RigidBody, Velocity};

use crate::combat::{HitFlash, MeleeConfig, MeleeCooldowns};
use crate::components::Health;
use crate::nav::NavAgent;
use crate::physics::{collision, GroundState, GroundingConfig, PhysicsBody};
use crate::SimSet;

pub mod activation;
pub mod animation;
pub mod behavior;

// Re-export основных типов
pub use activation::{alert_nearby_npcs, apply_activation_commands, ActivationCommand, AlertNearbyNpcs};
pub use animation::{
    locomotion_for, update_animation_intent, AnimationIntent, AttackTriggered, DeathTriggered,
    Locomotion,
};
pub use behavior::{
    npc_attack_execution, npc_fsm_transitions, npc_navigation_from_state, Npc, NpcConfig, NpcState,
};

/// NPC Plugin
///
/// Порядок выполнения (chain в SimSet::Behavior):
/// 1. alert_nearby_npcs — зона обнаружения → команды активации
/// 2. apply_activation_commands — активация (Chasing немедленно, если в радиусе)
/// 3. npc_fsm_transitions — переходы FSM + смерть
/// 4. npc_navigation_from_state — destination/speed per state
/// 5. npc_attack_execution — доворот, гейт атаки, урон
pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ActivationCommand>()
            .add_event::<AlertNearbyNpcs>()
            .add_event::<AttackTriggered>()
            .add_event::<DeathTriggered>()
            .add_systems(
                Update,
                (
                    alert_nearby_npcs,
                    apply_activation_commands,
                    npc_fsm_transitions,
                    npc_navigation_from_state,
                    npc_attack_execution,
                )
                    .chain()
                    .in_set(SimSet::Behavior),
            )
            .add_systems(
                Update,
                update_animation_intent.in_set(SimSet::Animation),
            );
    }
}

/// Spawn helper: полный NPC
///
/// Поведение + здоровье + реестр cooldown'ов + grounding + физическое тело +
/// nav-агент + rapier капсула с замороженным вращением (тело не опрокидывается
/// при падении).
pub fn spawn_npc(commands: &mut Commands, position: Vec3, config: NpcConfig) -> Entity {
    commands
        .spawn((
            (
                Transform::from_translation(position),
                Npc {
                    // Стартуем с взведённым таймером — первая точка сразу
                    wander_clock: config.wander_timer,
                    ..Default::default()
                },
                Health::new(config.max_health),
                NavAgent {
                    speed: config.wander_speed,
                    ..Default::default()
                },
                AnimationIntent::default(),
                config,
            ),
            (
                MeleeCooldowns::default(),
                MeleeConfig::default(),
                HitFlash::default(),
            ),
            (
                GroundState::default(),
                GroundingConfig::default(),
                PhysicsBody::default(),
            ),
            (
                RigidBody::KinematicPositionBased,
                Collider::capsule_y(0.5, 0.4), // Высота 1.0m + радиус 0.4m
                Velocity::default(),
                LockedAxes::ROTATION_LOCKED,
                collision::actor_groups(),
            ),
        ))
        .id()
}
