//! Headless симуляция STRAYRUN
//!
//! Запускает Bevy App без рендера: игрок + три NPC, тревога по зоне,
//! 1000 тиков с прогресс-логом

use bevy::prelude::*;
use strayrun_simulation::{
    create_headless_app, spawn_npc, spawn_player, AlertNearbyNpcs, Npc, NpcConfig,
};

fn main() {
    let seed = 42;
    println!("Starting STRAYRUN headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    // Игрок в центре, NPC вокруг
    let player = spawn_player(&mut app.world_mut().commands(), Vec3::new(0.0, 0.0, 0.0));
    for position in [
        Vec3::new(6.0, 0.0, -4.0),
        Vec3::new(-8.0, 0.0, -6.0),
        Vec3::new(4.0, 0.0, 10.0),
    ] {
        spawn_npc(&mut app.world_mut().commands(), position, NpcConfig::default());
    }

    // Первый тик применяет spawn-команды
    app.update();

    // Тревога: все NPC в радиусе 20m переключаются на игрока
    app.world_mut().send_event(AlertNearbyNpcs {
        origin: Vec3::ZERO,
        radius: 20.0,
        target: player,
    });

    // Прогоняем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let mut states = Vec::new();
            let mut query = app.world_mut().query::<&Npc>();
            for npc in query.iter(app.world()) {
                states.push(format!("{:?}", npc.state));
            }
            println!("Tick {}: NPC states: {:?}", tick, states);
        }
    }

    println!("Simulation complete!");
}
