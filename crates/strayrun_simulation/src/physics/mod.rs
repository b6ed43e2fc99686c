//! Physics module — тело актора, collision groups, grounding/падение
//!
//! Порядок в кадре: `restore_navigation` (отложенный тик) → `probe_ground` →
//! `apply_fall_transitions`; сила гравитации и интеграция airborne тел — в
//! FixedUpdate, до per-frame логики кадра.

use bevy::prelude::*;

use crate::SimSet;

pub mod body;
pub mod collision;
pub mod grounding;

// Re-export основных типов
pub use body::{apply_fall_gravity, integrate_falling_bodies, PhysicsBody, GRAVITY};
pub use grounding::{
    apply_fall_transitions, probe_ground, restore_navigation, GroundState, GroundingConfig,
    PendingNavRestore,
};

/// Grounding Plugin
///
/// Порядок выполнения:
/// 1. restore_navigation — отложенный re-enable агента (SimSet::Restore)
/// 2. probe_ground → apply_fall_transitions — grounding до поведения
/// 3. FixedUpdate: apply_fall_gravity → integrate_falling_bodies
pub struct GroundingPlugin;

impl Plugin for GroundingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, restore_navigation.in_set(SimSet::Restore))
            .add_systems(
                Update,
                (probe_ground, apply_fall_transitions)
                    .chain()
                    .in_set(SimSet::Grounding),
            )
            .add_systems(
                FixedUpdate,
                (apply_fall_gravity, integrate_falling_bodies).chain(),
            );
    }
}
