//! Анимационный intent — выход для внешнего анимационного collaborator'а
//!
//! Дискретный сигнал per tick: ровно один locomotion (Idle/Walk/Run) в
//! компоненте `AnimationIntent`; поверх — one-shot рёбра `AttackTriggered` и
//! `DeathTriggered` событиями (fire-and-forget, без ответа).

use bevy::prelude::*;

use crate::nav::NavAgent;
use crate::npc::behavior::{Npc, NpcConfig, NpcState};

/// Locomotion-сигнал (ровно один активен за тик)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Locomotion {
    #[default]
    Idle,
    Walk,
    Run,
}

/// Per-tick анимационный intent NPC
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AnimationIntent {
    pub locomotion: Locomotion,
}

/// One-shot: атака выполнена на этом тике
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackTriggered {
    pub entity: Entity,
}

/// One-shot: NPC вошёл в Dead (ровно один раз)
#[derive(Event, Debug, Clone, Copy)]
pub struct DeathTriggered {
    pub entity: Entity,
}

/// Маппинг state → locomotion
///
/// Wandering гейтится фактической скоростью агента: стоим — Idle, идём — Walk.
pub fn locomotion_for(state: NpcState, nav_speed: f32, walk_threshold: f32) -> Locomotion {
    match state {
        NpcState::Wandering => {
            if nav_speed > walk_threshold {
                Locomotion::Walk
            } else {
                Locomotion::Idle
            }
        }
        NpcState::Chasing => Locomotion::Run,
        NpcState::Attacking | NpcState::Dead => Locomotion::Idle,
    }
}

/// Система: обновление locomotion-сигнала
pub fn update_animation_intent(
    mut npcs: Query<(&Npc, &NpcConfig, &NavAgent, &mut AnimationIntent)>,
) {
    for (npc, config, agent, mut intent) in npcs.iter_mut() {
        intent.locomotion = locomotion_for(
            npc.state,
            agent.velocity.length(),
            config.velocity_walk_threshold,
        );
    }
}
