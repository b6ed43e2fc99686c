//! FSM поведения NPC
//!
//! Конечный автомат: Wandering → Chasing → Attacking (+ поглощающее Dead).
//! Оценивается раз в кадр и ТОЛЬКО когда NPC grounded и не falling — в
//! воздухе телом владеет физика, не поведение. Смерть проверяется всегда.
//!
//! Порядок систем (chain внутри SimSet::Behavior):
//! 1. alert_nearby_npcs / apply_activation_commands — внешняя активация
//! 2. npc_fsm_transitions — переходы состояний + проверка смерти
//! 3. npc_navigation_from_state — destination/speed per state
//! 4. npc_attack_execution — доворот по yaw, гейт атаки, урон цели

use bevy::prelude::*;
use bevy_rapier3d::prelude::ColliderDisabled;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{Dead, DespawnAfter, InflictDamage};
use crate::components::Health;
use crate::nav::{NavAgent, WorldSurface};
use crate::npc::animation::{AttackTriggered, DeathTriggered};
use crate::physics::GroundState;
use crate::DeterministicRng;

/// Состояния NPC
///
/// Ровно одно активно; `Dead` поглощающее — выхода нет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum NpcState {
    #[default]
    Wandering,
    Chasing,
    Attacking,
    Dead,
}

/// Контроллер поведения NPC
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Npc {
    pub state: NpcState,
    /// Взведён внешней активацией; сбрасывается при потере цели
    pub activated: bool,
    /// Слабая ссылка на цель (жизнью цели NPC не владеет)
    pub target: Option<Entity>,
    /// Аккумулятор времени wander'а; сброс при каждой новой точке
    pub wander_clock: f32,
    /// Абсолютный момент симуляции, раньше которого атака запрещена
    pub next_attack_time: f32,
}

impl Npc {
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_dead(&self) -> bool {
        self.state == NpcState::Dead
    }
}

/// Параметры поведения NPC
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct NpcConfig {
    pub max_health: f32,
    /// Радиус выбора случайной точки wander'а
    pub wander_radius: f32,
    /// Интервал между новыми wander-точками (секунды)
    pub wander_timer: f32,
    pub chase_speed: f32,
    pub wander_speed: f32,
    /// Дистанция перехода Chasing → Attacking
    pub attack_range: f32,
    pub attack_damage: f32,
    /// Интервал между атаками (секунды)
    pub attack_cooldown: f32,
    /// Радиус, в котором активированный NPC начинает погоню
    pub detection_range: f32,
    /// Скорость доворота к цели при атаке (rad-фактор slerp)
    pub turn_rate: f32,
    /// Порог velocity для Walk-анимации
    pub velocity_walk_threshold: f32,
    /// Задержка despawn'а после смерти (death presentation)
    pub death_despawn_delay: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            wander_radius: 20.0,
            wander_timer: 5.0,
            chase_speed: 5.0,
            wander_speed: 2.0,
            attack_range: 2.0,
            attack_damage: 10.0,
            attack_cooldown: 2.0,
            detection_range: 10.0,
            turn_rate: 5.0,
            velocity_walk_threshold: 0.1,
            death_despawn_delay: 3.0,
        }
    }
}

/// Перевод NPC в поглощающее Dead со всеми side effect'ами
///
/// Навигация стоп + выключена, hit-коллайдер отключён, despawn по таймеру,
/// one-shot Death-триггер. Используется и FSM, и реестром урона — смерть
/// наступает в том же вызове, который уронил health в ноль.
pub(crate) fn enter_dead(
    commands: &mut Commands,
    entity: Entity,
    npc: &mut Npc,
    agent: Option<&mut NavAgent>,
    despawn_delay: f32,
    deaths: &mut EventWriter<DeathTriggered>,
) {
    npc.state = NpcState::Dead;

    if let Some(agent) = agent {
        agent.stop();
        agent.enabled = false;
        agent.velocity = Vec3::ZERO;
    }

    commands
        .entity(entity)
        .insert((Dead, ColliderDisabled, DespawnAfter::new(despawn_delay)));
    deaths.write(DeathTriggered { entity });

    crate::log_info(&format!("NPC {:?} died", entity));
}

/// Система: переходы FSM
///
/// Смерть проверяется в любом не-Dead состоянии (и в воздухе); остальные
/// переходы — только grounded и не falling.
pub fn npc_fsm_transitions(
    mut commands: Commands,
    time: Res<Time>,
    mut npcs: Query<(
        Entity,
        &NpcConfig,
        &GroundState,
        &Transform,
        &mut Npc,
        &mut NavAgent,
        &Health,
    )>,
    targets: Query<&Transform, Without<Npc>>,
    mut deaths: EventWriter<DeathTriggered>,
) {
    let delta = time.delta_secs();

    for (entity, config, ground, transform, mut npc, mut agent, health) in npcs.iter_mut() {
        if npc.is_dead() {
            continue;
        }

        if health.current <= 0.0 {
            enter_dead(
                &mut commands,
                entity,
                &mut npc,
                Some(agent.into_inner()),
                config.death_despawn_delay,
                &mut deaths,
            );
            continue;
        }

        if !ground.grounded || ground.falling {
            continue;
        }

        // Аккумулятор wander'а тикает только на земле
        npc.wander_clock += delta;

        match npc.state {
            NpcState::Wandering => {
                // Погоня стартует только по внешней активации
                if npc.activated {
                    if let Some(target) = npc.target {
                        if let Ok(target_transform) = targets.get(target) {
                            let distance =
                                transform.translation.distance(target_transform.translation);
                            if distance <= config.detection_range {
                                npc.state = NpcState::Chasing;
                            }
                        }
                    }
                }
            }

            NpcState::Chasing => {
                let target_transform = npc.target.and_then(|target| targets.get(target).ok());
                let Some(target_transform) = target_transform else {
                    // Цель пропала — обратно в wander
                    npc.state = NpcState::Wandering;
                    npc.activated = false;
                    continue;
                };

                let distance = transform.translation.distance(target_transform.translation);
                if distance > config.detection_range {
                    // Цель сбежала: деактивация, скорость обратно на wander
                    npc.state = NpcState::Wandering;
                    npc.activated = false;
                    npc.target = None;
                    agent.speed = config.wander_speed;
                } else if distance <= config.attack_range {
                    npc.state = NpcState::Attacking;
                    agent.stop();
                }
            }

            NpcState::Attacking => {
                let target_transform = npc.target.and_then(|target| targets.get(target).ok());
                let Some(target_transform) = target_transform else {
                    npc.state = NpcState::Wandering;
                    agent.resume();
                    continue;
                };

                let distance = transform.translation.distance(target_transform.translation);
                if distance > config.attack_range {
                    // Цель вышла из радиуса удара — догоняем
                    npc.state = NpcState::Chasing;
                    agent.resume();
                }
            }

            NpcState::Dead => {}
        }
    }
}

/// Система: навигационные команды per state
pub fn npc_navigation_from_state(
    mut rng: ResMut<DeterministicRng>,
    surface: Res<WorldSurface>,
    mut npcs: Query<(&NpcConfig, &GroundState, &Transform, &mut Npc, &mut NavAgent)>,
    targets: Query<&Transform, Without<Npc>>,
) {
    for (config, ground, transform, mut npc, mut agent) in npcs.iter_mut() {
        if npc.is_dead() || !ground.grounded || ground.falling {
            continue;
        }

        match npc.state {
            NpcState::Wandering => {
                if npc.wander_clock >= config.wander_timer {
                    let destination = random_wander_point(
                        &mut rng.rng,
                        &surface,
                        transform.translation,
                        config.wander_radius,
                    );
                    agent.set_destination(destination);
                    npc.wander_clock = 0.0;
                }
                // Каждый тик: защита от устаревшей chase-скорости
                agent.speed = config.wander_speed;
            }

            NpcState::Chasing => {
                // Цель движется — переиздаём destination каждый тик
                if let Some(target_transform) =
                    npc.target.and_then(|target| targets.get(target).ok())
                {
                    agent.set_destination(target_transform.translation);
                    agent.speed = config.chase_speed;
                }
            }

            NpcState::Attacking | NpcState::Dead => {}
        }
    }
}

/// Система: исполнение атаки
///
/// Доворот к цели только по yaw (pitch/roll держим ровно), атака по гейту
/// абсолютного времени. Урон уходит событием — реестр применит его к Health
/// цели (или молча-с-warning'ом проигнорирует, если Health у цели нет).
pub fn npc_attack_execution(
    time: Res<Time>,
    mut npcs: Query<(Entity, &NpcConfig, &GroundState, &mut Transform, &mut Npc)>,
    targets: Query<&Transform, Without<Npc>>,
    mut attacks: EventWriter<AttackTriggered>,
    mut inflict: EventWriter<InflictDamage>,
) {
    let now = time.elapsed_secs();
    let delta = time.delta_secs();

    for (entity, config, ground, mut transform, mut npc) in npcs.iter_mut() {
        if npc.state != NpcState::Attacking || !ground.grounded || ground.falling {
            continue;
        }
        let Some(target) = npc.target else {
            continue;
        };
        let Ok(target_transform) = targets.get(target) else {
            continue;
        };

        face_toward_yaw(
            &mut transform,
            target_transform.translation,
            config.turn_rate * delta,
        );

        if now >= npc.next_attack_time {
            // One-shot триггер для анимационного collaborator'а, затем урон
            attacks.write(AttackTriggered { entity });
            inflict.write(InflictDamage {
                target,
                amount: config.attack_damage,
                source: Some(entity),
            });
            npc.next_attack_time = now + config.attack_cooldown;
        }
    }
}

/// Плавный доворот к точке только по yaw (pitch/roll остаются ровными)
fn face_toward_yaw(transform: &mut Transform, target: Vec3, t: f32) {
    let to = target - transform.translation;
    let flat = Vec3::new(to.x, 0.0, to.z);
    if flat.length_squared() < 1e-6 {
        return;
    }
    // Forward у Bevy — -Z
    let target_yaw = (-flat.x).atan2(-flat.z);
    let desired = Quat::from_rotation_y(target_yaw);
    transform.rotation = transform.rotation.slerp(desired, t.clamp(0.0, 1.0));
}

/// Случайная wander-точка: точка в сфере радиуса `radius`, спроецированная
/// на навигируемую поверхность; промах проекции — остаёмся на origin
fn random_wander_point(
    rng: &mut ChaCha8Rng,
    surface: &WorldSurface,
    origin: Vec3,
    radius: f32,
) -> Vec3 {
    let candidate = origin + random_in_unit_sphere(rng) * radius;
    surface.sample_navigable(candidate, radius).unwrap_or(origin)
}

fn random_in_unit_sphere(rng: &mut ChaCha8Rng) -> Vec3 {
    // Rejection sampling — равномерно по объёму сферы
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_npc_defaults() {
        let npc = Npc::default();
        assert_eq!(npc.state, NpcState::Wandering);
        assert!(!npc.is_activated());
        assert!(!npc.is_dead());
        assert!(npc.target.is_none());
    }

    #[test]
    fn test_npc_config_defaults() {
        let config = NpcConfig::default();
        assert_eq!(config.detection_range, 10.0);
        assert_eq!(config.attack_range, 2.0);
        assert_eq!(config.attack_cooldown, 2.0);
        assert!(config.chase_speed > config.wander_speed);
    }

    #[test]
    fn test_face_toward_yaw_converges() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        let target = Vec3::new(10.0, 0.0, 0.0);

        // Много маленьких шагов — должны смотреть на цель
        for _ in 0..200 {
            face_toward_yaw(&mut transform, target, 0.2);
        }

        let forward = transform.rotation * Vec3::NEG_Z;
        assert!(forward.x > 0.99, "forward = {:?}", forward);
        assert!(forward.y.abs() < 1e-3);
    }

    #[test]
    fn test_face_toward_yaw_keeps_level() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        // Цель выше по Y — pitch игнорируется
        let target = Vec3::new(0.0, 5.0, 10.0);

        for _ in 0..200 {
            face_toward_yaw(&mut transform, target, 0.2);
        }

        let forward = transform.rotation * Vec3::NEG_Z;
        assert!(forward.y.abs() < 1e-3, "forward = {:?}", forward);
        assert!(forward.z > 0.99);
    }

    #[test]
    fn test_random_in_unit_sphere_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_in_unit_sphere(&mut rng);
            assert!(v.length_squared() <= 1.0);
        }
    }

    #[test]
    fn test_wander_point_projected_to_surface() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let surface = WorldSurface::flat(50.0, 0.0);

        for _ in 0..20 {
            let point = random_wander_point(&mut rng, &surface, Vec3::ZERO, 20.0);
            assert_eq!(point.y, 0.0);
            assert!(surface.is_navigable(point.x, point.z));
        }
    }
}
