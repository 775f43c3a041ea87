use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use log::info;

use character_core::engine::game_loop::GameLoop;
use character_core::engine::input::CharacterIntent;
use character_core::game::characters::{CharacterEvent, CharacterId, CharacterManager};
use character_core::game::combat::PositionProvider;
use character_core::game::config::SimulationConfig;

/// Experience granted for finishing off an opponent
const KILL_EXPERIENCE: f64 = 120.0;

/// Headless character duel
#[derive(Debug, Parser)]
#[command(name = "character-sim", version, about)]
struct Args {
    /// JSON simulation config (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the world seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of fixed simulation steps
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,
}

/// Walk toward the target, swing when close enough
fn duel_intent(manager: &CharacterManager, id: CharacterId) -> CharacterIntent {
    let Some(character) = manager.get(id) else {
        return CharacterIntent::idle();
    };
    let Some(target_pos) = character.target().and_then(|t| manager.position_of(t)) else {
        return CharacterIntent::idle();
    };

    let to_target = target_pos - character.position;
    let reach = character.combat().config().attack_range * 0.9;
    if to_target.length() > reach {
        CharacterIntent::moving(to_target)
    } else {
        CharacterIntent::idle().with_attack(true)
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let progression = Arc::new(config.progression_table()?);

    info!("Starting duel with seed {}", config.seed);

    let mut manager = CharacterManager::from_config(&config, progression);
    let fighters = [
        manager.spawn("Ayla", Vec3::new(-3.0, 0.0, 0.0)),
        manager.spawn("Brom", Vec3::new(3.0, 0.0, 0.0)),
    ];
    manager.set_target(fighters[0], Some(fighters[1]));
    manager.set_target(fighters[1], Some(fighters[0]));

    let deaths: Rc<RefCell<Vec<CharacterId>>> = Rc::new(RefCell::new(Vec::new()));
    for &id in &fighters {
        let deaths = Rc::clone(&deaths);
        if let Some(character) = manager.get_mut(id) {
            character.subscribe(move |event| match event {
                CharacterEvent::Death => deaths.borrow_mut().push(id),
                CharacterEvent::LeveledUp(level) => info!("Character {} reached level {}", id, level),
                _ => {}
            });
        }
    }

    let mut game_loop = GameLoop::new();
    let frame = game_loop.fixed_step_duration();
    let dt = game_loop.fixed_timestep();

    'sim: while manager.clock().steps() < args.ticks {
        for _ in 0..game_loop.advance(frame) {
            for &id in &fighters {
                let intent = duel_intent(&manager, id);
                manager.apply_intent(id, &intent);
            }
            manager.tick(dt);

            let fallen: Vec<CharacterId> = deaths.borrow_mut().drain(..).collect();
            for dead in fallen {
                for &winner in fighters.iter().filter(|&&id| id != dead) {
                    manager.award_experience(winner, KILL_EXPERIENCE);
                }
            }

            if manager.alive_count() <= 1 || manager.clock().steps() >= args.ticks {
                break 'sim;
            }
        }
    }

    info!(
        "Simulated {} steps over {} frames ({:.2}s)",
        manager.clock().steps(),
        game_loop.frame_count(),
        manager.now()
    );
    for character in manager.iter() {
        let stats = character.stats();
        info!(
            "{}: {} | health {:.1}/{:.1} | level {} | experience {:.0}",
            character.name,
            character.state().name(),
            stats.health(),
            stats.max_health(),
            stats.level(),
            stats.experience()
        );
    }

    Ok(())
}
