//! STRAYRUN Simulation Core
//!
//! Headless ECS-симуляция NPC на Bevy 0.16 (single-process)
//!
//! Архитектура:
//! - ECS = simulation core (FSM поведения, grounding/падение, урон/cooldown)
//! - Host (рендер, input, навигационный сервис) = внешние collaborators,
//!   подключаются через контракты: `NavAgent`, `WorldSurface`, события активации,
//!   `AnimationIntent` + one-shot триггеры
//!
//! Два такта:
//! - `Update` (переменный) — grounding, FSM, таймеры, контакты; порядок жёсткий
//!   через `SimSet` (grounding ДО поведения в одном логическом шаге)
//! - `FixedUpdate` (60Hz) — гравитация падения + интеграция airborne тел

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod combat;
pub mod components;
pub mod logger;
pub mod nav;
pub mod npc;
pub mod physics;

// Re-export базовых типов для удобства
pub use combat::{
    Dead, DamageDealt, DespawnAfter, EntityDied, HitFlash, InflictDamage, MeleeConfig,
    MeleeCooldowns, WeaponContact, WeaponHitbox, spawn_melee_weapon, spawn_projectile,
};
pub use components::{DamageSource, Health, Player, ProjectileDamage};
pub use logger::*;
pub use nav::{NavAgent, WorldSurface};
pub use npc::{
    ActivationCommand, AlertNearbyNpcs, AnimationIntent, AttackTriggered, DeathTriggered,
    Locomotion, Npc, NpcConfig, NpcState, spawn_npc,
};
pub use physics::{GroundState, GroundingConfig, PhysicsBody};

/// Частота фиксированного такта симуляции
pub const SIMULATION_HZ: f64 = 60.0;

/// Порядок выполнения per-frame систем внутри `Update`
///
/// Один логический шаг: отложенный restore навигации → grounding →
/// поведение → навигация → анимационный intent → контакты/урон.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Отложенные на один тик действия (re-enable агента после приземления)
    Restore,
    /// Ground probe + гистерезис падения
    Grounding,
    /// FSM поведения NPC (активация, переходы, атака)
    Behavior,
    /// Движение nav-агентов к назначению
    Navigation,
    /// Анимационные сигналы (locomotion per tick)
    Animation,
    /// Контакты оружия, реестр урона/cooldown, таймеры смерти
    Contacts,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для физического такта (легче считать интервалы)
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                Update,
                (
                    SimSet::Restore,
                    SimSet::Grounding,
                    SimSet::Behavior,
                    SimSet::Navigation,
                    SimSet::Animation,
                    SimSet::Contacts,
                )
                    .chain(),
            )
            // Подсистемы
            .add_plugins((
                physics::GroundingPlugin,
                nav::NavigationPlugin,
                npc::NpcPlugin,
                combat::CombatPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную: один `app.update()` == один кадр 60Hz,
/// поэтому headless прогоны и тесты детерминистичны независимо от wall-clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )));

    app
}

/// Spawn helper: игрок (combat target ядра)
///
/// Ядру от цели нужна только capability `Health` (player-вариант, с клампом);
/// движение/input игрока — внешний collaborator.
pub fn spawn_player(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Player,
            Health::new(100.0),
            Transform::from_translation(position),
        ))
        .id()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
