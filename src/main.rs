/// Entry point and event loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::Duration;

use log::{error, info, warn};

use config::GameConfig;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{self, InputState};
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};
use ui::sprites::SpriteSet;

/// How long to block waiting for keys before checking the gamepad again.
const INPUT_WAIT: Duration = Duration::from_millis(16);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("config: {w}");
    }
    info!(
        "starting: grid {}x{}, viewport {}x{}, {} items, {} enemies",
        config.grid.width, config.grid.height,
        config.viewport.width, config.viewport.height,
        config.spawn.initial_items, config.spawn.initial_enemies,
    );

    let mut world = WorldState::new(&config);

    let sprites = match SpriteSet::load(&config.assets) {
        Ok(set) => Some(set),
        Err(e) => {
            error!("sprite loading failed, drawing glyphs instead: {e}");
            None
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sprites.as_ref(), sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    info!("finished after {} key presses with {} gold", world.key_presses, world.gold);
    println!();
    println!("Thanks for playing Grid Game!");
    println!("Gold: {}", world.gold);
}

/// Logs go to a file since stdout is the game screen. `RUST_LOG` overrides
/// the default `info` filter.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);

    match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", config.log_file.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }

    builder.init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sprites: Option<&SpriteSet>,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    renderer.render(world, sprites)?;

    loop {
        kb.wait_events(INPUT_WAIT)?;
        gp.update();

        if kb.quit_pressed() || gp.quit_pressed() {
            break;
        }

        let mut dirty = kb.resized;

        // Every press runs a full step, movement key or not.
        for key in &kb.presses {
            let events = step::step(world, input::movement_for(key.code));
            sound::play_events(sound, &events);
            dirty = true;
        }
        for &dir in gp.moves() {
            let events = step::step(world, Some(dir));
            sound::play_events(sound, &events);
            dirty = true;
        }

        if dirty {
            renderer.render(world, sprites)?;
        }
    }

    Ok(())
}
