//! Внешняя активация NPC
//!
//! Погоня стартует не по близости, а по явному внешнему сигналу (зона
//! обнаружения, скрипт). Контракт ядра — события `ActivationCommand`;
//! обрабатываются ДО FSM в том же кадре, поэтому активация в радиусе
//! обнаружения даёт Chasing немедленно, без ожидания следующего опроса.

use bevy::prelude::*;

use crate::nav::NavAgent;
use crate::npc::behavior::{Npc, NpcConfig, NpcState};

/// Команды активации от внешнего collaborator'а
#[derive(Event, Debug, Clone, Copy)]
pub enum ActivationCommand {
    /// Игрок взвёл NPC; no-op если NPC мёртв
    Activate { npc: Entity, target: Entity },
    /// Сброс в Wandering, цель и флаг активации очищаются
    Deactivate { npc: Entity },
}

/// Сигнал зоны обнаружения: взвести всех живых NPC в радиусе
#[derive(Event, Debug, Clone, Copy)]
pub struct AlertNearbyNpcs {
    pub origin: Vec3,
    pub radius: f32,
    pub target: Entity,
}

/// Система: зона обнаружения → команды активации
///
/// Дистанционный скан по NPC entity (OverlapSphere остаётся у внешнего
/// collaborator'а с настоящими коллайдерами).
pub fn alert_nearby_npcs(
    mut alerts: EventReader<AlertNearbyNpcs>,
    mut commands_out: EventWriter<ActivationCommand>,
    npcs: Query<(Entity, &Transform, &Npc)>,
) {
    for alert in alerts.read() {
        let mut activated = 0;
        for (entity, transform, npc) in npcs.iter() {
            if npc.is_dead() {
                continue;
            }
            if transform.translation.distance(alert.origin) <= alert.radius {
                commands_out.write(ActivationCommand::Activate {
                    npc: entity,
                    target: alert.target,
                });
                activated += 1;
            }
        }
        crate::log(&format!("Alert at {:?}: {} NPC activated", alert.origin, activated));
    }
}

/// Система: применение команд активации
pub fn apply_activation_commands(
    mut events: EventReader<ActivationCommand>,
    mut npcs: Query<(&NpcConfig, &Transform, &mut Npc, &mut NavAgent)>,
    targets: Query<&Transform, Without<Npc>>,
) {
    for event in events.read() {
        match *event {
            ActivationCommand::Activate { npc, target } => {
                let Ok((config, transform, mut npc, _)) = npcs.get_mut(npc) else {
                    continue;
                };
                if npc.is_dead() {
                    continue;
                }

                npc.target = Some(target);
                npc.activated = true;

                // Уже в радиусе обнаружения — в погоню немедленно
                if let Ok(target_transform) = targets.get(target) {
                    if transform.translation.distance(target_transform.translation)
                        <= config.detection_range
                    {
                        npc.state = NpcState::Chasing;
                    }
                }
            }

            ActivationCommand::Deactivate { npc } => {
                let Ok((config, _, mut npc, mut agent)) = npcs.get_mut(npc) else {
                    continue;
                };

                npc.activated = false;
                npc.target = None;
                // Dead поглощающее: состояние трупа не трогаем
                if !npc.is_dead() {
                    npc.state = NpcState::Wandering;
                    agent.speed = config.wander_speed;
                    agent.resume();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_command_variants() {
        let activate = ActivationCommand::Activate {
            npc: Entity::PLACEHOLDER,
            target: Entity::PLACEHOLDER,
        };
        assert!(matches!(activate, ActivationCommand::Activate { .. }));

        let deactivate = ActivationCommand::Deactivate {
            npc: Entity::PLACEHOLDER,
        };
        assert!(matches!(deactivate, ActivationCommand::Deactivate { .. }));
    }
}
