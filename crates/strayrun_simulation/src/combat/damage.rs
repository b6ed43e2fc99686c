//! Применение урона + смерть + hit flash
//!
//! Весь урон ходит событием `InflictDamage` (от реестра контактов, от атак
//! NPC по игроку, от host-скриптов). Применение синхронное внутри одного
//! прогона системы: если health ушёл в ноль — переход в Dead происходит в том
//! же вызове, следующий кадр уже видит труп.

use bevy::prelude::*;

use crate::combat::melee::MeleeConfig;
use crate::components::Health;
use crate::nav::NavAgent;
use crate::npc::animation::DeathTriggered;
use crate::npc::behavior::{self, Npc, NpcConfig};

/// Команда: нанести урон цели
///
/// `source` — логический атакующий (для событий/диагностики), `None` для
/// скриптового урона.
#[derive(Event, Debug, Clone, Copy)]
pub struct InflictDamage {
    pub target: Entity,
    pub amount: f32,
    pub source: Option<Entity>,
}

/// Событие: урон применён к Health
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub target_died: bool,
}

/// Событие: entity умер (health ≤ 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мёртв
///
/// Для визуальных эффектов host'а (death animation, fade-out).
#[derive(Component, Debug)]
pub struct Dead;

/// Despawn по таймеру (grace period для death presentation)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl Default for DespawnAfter {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl DespawnAfter {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}

/// Визуальный флаг попадания
///
/// Ядро НЕ трогает рендер-ресурсы: rendering collaborator читает флаг и сам
/// красит свои поверхности. Повторное попадание рестартует таймер, не стекает.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct HitFlash {
    pub flashing: bool,
    pub remaining: f32,
}

/// Рестарт flash-таймера (не стек)
pub fn trigger_hit_flash(flash: &mut HitFlash, duration: f32) {
    flash.flashing = true;
    flash.remaining = duration;
}

/// Система: тик flash-таймера, автоматический сброс по истечении
pub fn tick_hit_flash(time: Res<Time>, mut query: Query<&mut HitFlash>) {
    let delta = time.delta_secs();

    for mut flash in query.iter_mut() {
        if !flash.flashing {
            continue;
        }
        flash.remaining -= delta;
        if flash.remaining <= 0.0 {
            flash.flashing = false;
            flash.remaining = 0.0;
        }
    }
}

/// Система: применение `InflictDamage`
///
/// NPC-вариант: вычитание без нижнего клампа (транзиентный минус наблюдаем
/// один момент), hit flash, проверка смерти сразу за вычитанием. Цель без
/// `Npc` (игрок): кламп в [0, max], без перехода состояний — смерть игрока
/// разбирает его собственный collaborator. Цель без Health — warning, no-op.
pub fn apply_inflicted_damage(
    mut commands: Commands,
    mut events: EventReader<InflictDamage>,
    mut targets: Query<(
        Entity,
        &mut Health,
        Option<&mut Npc>,
        Option<&NpcConfig>,
        Option<&mut HitFlash>,
        Option<&MeleeConfig>,
        Option<&mut NavAgent>,
    )>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut deaths: EventWriter<DeathTriggered>,
) {
    for event in events.read() {
        let Ok((entity, mut health, npc, config, flash, melee, agent)) =
            targets.get_mut(event.target)
        else {
            crate::log_warning(&format!(
                "InflictDamage: target {:?} has no Health, damage dropped",
                event.target
            ));
            continue;
        };

        match npc {
            Some(mut npc) => {
                if npc.is_dead() {
                    continue;
                }

                health.take_damage(event.amount);
                if let (Some(mut flash), Some(melee)) = (flash, melee) {
                    trigger_hit_flash(&mut flash, melee.hit_flash_duration);
                }

                let died = health.current <= 0.0;
                damage_events.write(DamageDealt {
                    attacker: event.source,
                    target: entity,
                    amount: event.amount,
                    target_died: died,
                });
                crate::log(&format!(
                    "NPC {:?} took {} damage (health: {})",
                    entity, event.amount, health.current
                ));

                if died {
                    died_events.write(EntityDied {
                        entity,
                        killer: event.source,
                    });
                    let despawn_delay = config.map_or(3.0, |c| c.death_despawn_delay);
                    behavior::enter_dead(
                        &mut commands,
                        entity,
                        &mut npc,
                        agent.map(|a| a.into_inner()),
                        despawn_delay,
                        &mut deaths,
                    );
                }
            }

            None => {
                // Player-вариант: кламп, без перехода состояний
                health.take_damage_clamped(event.amount);
                let died = !health.is_alive();
                damage_events.write(DamageDealt {
                    attacker: event.source,
                    target: entity,
                    amount: event.amount,
                    target_died: died,
                });
                crate::log(&format!(
                    "Target {:?} took {} damage (health: {}/{})",
                    entity, event.amount, health.current, health.max
                ));
            }
        }
    }
}

/// Система: тик despawn-таймеров трупов
pub fn despawn_after_timeout(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut DespawnAfter)>,
) {
    let delta = time.delta_secs();

    for (entity, mut timer) in query.iter_mut() {
        timer.remaining -= delta;
        if timer.remaining <= 0.0 {
            crate::log(&format!("Despawning dead entity {:?} after timeout", entity));
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_flash_restarts_not_stacks() {
        let mut flash = HitFlash::default();

        trigger_hit_flash(&mut flash, 0.2);
        assert!(flash.flashing);
        assert_eq!(flash.remaining, 0.2);

        flash.remaining = 0.05;
        // Повторный удар: таймер рестартует, не суммируется
        trigger_hit_flash(&mut flash, 0.2);
        assert_eq!(flash.remaining, 0.2);
    }

    #[test]
    fn test_hit_flash_expiry() {
        let mut flash = HitFlash {
            flashing: true,
            remaining: 0.01,
        };

        // Логика tick_hit_flash
        flash.remaining -= 0.016;
        if flash.remaining <= 0.0 {
            flash.flashing = false;
            flash.remaining = 0.0;
        }

        assert!(!flash.flashing);
        assert_eq!(flash.remaining, 0.0);
    }

    #[test]
    fn test_despawn_after_counts_down() {
        let mut timer = DespawnAfter::new(3.0);
        timer.remaining -= 1.5;
        assert!(timer.remaining > 0.0);
        timer.remaining -= 1.6;
        assert!(timer.remaining <= 0.0);
    }
}
