//! Navigation bridge — тонкий контракт над внешним path-following агентом
//!
//! # Architecture
//!
//! Ядро НЕ строит навигационный граф (non-goal). `NavAgent` — это командный
//! интерфейс агента: destination / speed / is_stopped / enabled, плюс velocity
//! для анимационного гейтинга. `WorldSurface` — граница внешних сервисов
//! (navigation service + physics query) в одном resource: высота поверхности,
//! проекция на навигируемую область, ground raycast.
//!
//! `drive_nav_agents` — исполнитель path-following на стороне симуляции:
//! прямолинейное следование к destination с приклейкой к высоте поверхности.
//! Host с настоящим NavMesh заменяет его своим исполнителем, контракт
//! компонента не меняется.

use bevy::prelude::*;

use crate::SimSet;

/// Дистанция прибытия: ближе — считаем destination достигнутым
const ARRIVE_EPSILON: f32 = 0.05;

/// Path-following агент (контракт внешнего навигационного сервиса)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Текущая цель; `None` — агент стоит
    pub destination: Option<Vec3>,
    /// Скорость движения (m/s), пишется поведением per state
    pub speed: f32,
    /// Остановлен командой (атака); destination сохраняется
    pub is_stopped: bool,
    /// Выключен целиком (падение, смерть); команды игнорируются
    pub enabled: bool,
    /// Фактическая скорость за последний тик (для анимации)
    pub velocity: Vec3,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 2.0,
            is_stopped: false,
            enabled: true,
            velocity: Vec3::ZERO,
        }
    }
}

impl NavAgent {
    pub fn set_destination(&mut self, point: Vec3) {
        self.destination = Some(point);
    }

    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    pub fn resume(&mut self) {
        self.is_stopped = false;
    }
}

/// Warp: мгновенный телепорт агента в точку, минуя pathing
///
/// Сбрасывает устаревший путь — destination становится самой точкой.
pub fn warp(agent: &mut NavAgent, transform: &mut Transform, point: Vec3) {
    transform.translation = point;
    agent.destination = Some(point);
    agent.velocity = Vec3::ZERO;
}

/// Результат ground raycast
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Pit {
    center: Vec2,
    radius: f32,
    floor: f32,
}

/// Поверхность мира — stand-in внешних navigation/physics query сервисов
///
/// Квадратный heightfield [-half_extent, half_extent]² на базовой высоте.
/// `cut_pit` вырезает круглую яму: область перестаёт быть навигируемой,
/// земля проваливается на дно ямы (NPC над ней начинает падать).
#[derive(Resource, Debug, Clone)]
pub struct WorldSurface {
    half_extent: f32,
    base_height: f32,
    pits: Vec<Pit>,
}

impl Default for WorldSurface {
    fn default() -> Self {
        Self::flat(100.0, 0.0)
    }
}

impl WorldSurface {
    pub fn flat(half_extent: f32, base_height: f32) -> Self {
        Self {
            half_extent,
            base_height,
            pits: Vec::new(),
        }
    }

    /// Вырезать яму глубиной `depth` (дно = base_height - depth)
    pub fn cut_pit(&mut self, center: Vec2, radius: f32, depth: f32) {
        self.pits.push(Pit {
            center,
            radius,
            floor: self.base_height - depth,
        });
    }

    pub fn clear_pits(&mut self) {
        self.pits.clear();
    }

    fn pit_at(&self, x: f32, z: f32) -> Option<&Pit> {
        self.pits
            .iter()
            .find(|pit| pit.center.distance(Vec2::new(x, z)) <= pit.radius)
    }

    /// Высота земли в точке; `None` — за границей мира (пустота)
    pub fn ground_height(&self, x: f32, z: f32) -> Option<f32> {
        if x.abs() > self.half_extent || z.abs() > self.half_extent {
            return None;
        }
        Some(self.pit_at(x, z).map_or(self.base_height, |pit| pit.floor))
    }

    /// Навигируемая ли точка (в границах и не в яме)
    pub fn is_navigable(&self, x: f32, z: f32) -> bool {
        x.abs() <= self.half_extent && z.abs() <= self.half_extent && self.pit_at(x, z).is_none()
    }

    /// Raycast вертикально вниз (ground probe)
    pub fn raycast_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        let ground = self.ground_height(origin.x, origin.z)?;
        if origin.y < ground {
            // Начало луча под поверхностью — промах
            return None;
        }
        let distance = origin.y - ground;
        (distance <= max_distance).then(|| SurfaceHit {
            point: Vec3::new(origin.x, ground, origin.z),
            normal: Vec3::Y,
        })
    }

    /// Ближайшая навигируемая точка в радиусе `max_radius` от `point`
    ///
    /// Сама точка, затем кольцевой перебор (8 направлений на двух радиусах).
    /// `None` — рядом навигируемой поверхности нет.
    pub fn sample_navigable(&self, point: Vec3, max_radius: f32) -> Option<Vec3> {
        let snap = |x: f32, z: f32| -> Option<Vec3> {
            self.is_navigable(x, z)
                .then(|| Vec3::new(x, self.base_height, z))
        };

        if let Some(snapped) = snap(point.x, point.z) {
            return Some(snapped);
        }
        for radius in [max_radius * 0.5, max_radius] {
            for i in 0..8 {
                let angle = i as f32 * std::f32::consts::TAU / 8.0;
                if let Some(snapped) = snap(point.x + angle.cos() * radius, point.z + angle.sin() * radius)
                {
                    return Some(snapped);
                }
            }
        }
        None
    }
}

/// Система: движение агентов к destination
///
/// Прямолинейный шаг speed × dt с приклейкой к высоте поверхности.
/// Выключенный/остановленный агент не двигается, velocity обнуляется.
pub fn drive_nav_agents(
    surface: Res<WorldSurface>,
    time: Res<Time>,
    mut agents: Query<(&mut NavAgent, &mut Transform)>,
) {
    let dt = time.delta_secs();

    for (mut agent, mut transform) in agents.iter_mut() {
        if !agent.enabled || agent.is_stopped {
            agent.velocity = Vec3::ZERO;
            continue;
        }
        let Some(destination) = agent.destination else {
            agent.velocity = Vec3::ZERO;
            continue;
        };

        // Движение только в плоскости XZ, высота — от поверхности
        let to = destination - transform.translation;
        let to_xz = Vec2::new(to.x, to.z);
        let distance = to_xz.length();

        if distance < ARRIVE_EPSILON {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let step = (agent.speed * dt).min(distance);
        let direction = to_xz / distance;
        transform.translation.x += direction.x * step;
        transform.translation.z += direction.y * step;

        let (x, z) = (transform.translation.x, transform.translation.z);
        if surface.is_navigable(x, z) {
            if let Some(height) = surface.ground_height(x, z) {
                transform.translation.y = height;
            }
        }

        agent.velocity = Vec3::new(direction.x, 0.0, direction.y) * agent.speed;
    }
}

/// Navigation Plugin
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldSurface>()
            .add_systems(Update, drive_nav_agents.in_set(SimSet::Navigation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_navigable_prefers_point_itself() {
        let surface = WorldSurface::flat(50.0, 0.0);
        let sampled = surface.sample_navigable(Vec3::new(3.0, 5.0, -4.0), 2.0);
        assert_eq!(sampled, Some(Vec3::new(3.0, 0.0, -4.0)));
    }

    #[test]
    fn test_sample_navigable_escapes_small_pit() {
        let mut surface = WorldSurface::flat(50.0, 0.0);
        surface.cut_pit(Vec2::ZERO, 0.6, 3.0);

        // Точка в яме, но кольцо радиуса 1.0 выходит за её край
        let sampled = surface.sample_navigable(Vec3::ZERO, 2.0);
        let snapped = sampled.expect("ring search should find navigable ground");
        assert!(surface.is_navigable(snapped.x, snapped.z));
    }

    #[test]
    fn test_sample_navigable_fails_inside_wide_pit() {
        let mut surface = WorldSurface::flat(50.0, 0.0);
        surface.cut_pit(Vec2::ZERO, 10.0, 3.0);

        assert_eq!(surface.sample_navigable(Vec3::ZERO, 1.0), None);
    }

    #[test]
    fn test_raycast_down_hits_within_range() {
        let surface = WorldSurface::flat(50.0, 0.0);

        let hit = surface.raycast_down(Vec3::new(0.0, 0.1, 0.0), 0.3);
        assert_eq!(hit.map(|h| h.point), Some(Vec3::ZERO));

        // Слишком высоко — промах
        assert!(surface.raycast_down(Vec3::new(0.0, 1.0, 0.0), 0.3).is_none());
    }

    #[test]
    fn test_raycast_down_misses_over_pit() {
        let mut surface = WorldSurface::flat(50.0, 0.0);
        surface.cut_pit(Vec2::ZERO, 5.0, 3.0);

        // Земля ушла на -3.0, короткий probe с высоты 0.1 не достаёт
        assert!(surface.raycast_down(Vec3::new(0.0, 0.1, 0.0), 0.3).is_none());
        // Probe у дна ямы — попадание
        assert!(surface.raycast_down(Vec3::new(0.0, -2.9, 0.0), 0.3).is_some());
    }

    #[test]
    fn test_ground_height_in_pit_and_out_of_bounds() {
        let mut surface = WorldSurface::flat(50.0, 0.0);
        surface.cut_pit(Vec2::new(10.0, 0.0), 2.0, 3.0);

        assert_eq!(surface.ground_height(0.0, 0.0), Some(0.0));
        assert_eq!(surface.ground_height(10.0, 0.0), Some(-3.0));
        // За границей мира земли нет
        assert_eq!(surface.ground_height(200.0, 0.0), None);
    }
}
