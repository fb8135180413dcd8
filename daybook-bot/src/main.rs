use dotenv::dotenv;
use std::sync::Arc;

mod channels;
mod config;
mod menu;
mod notes;
mod session;

use channels::NoteDispatcher;
use config::Config;
use notes::NoteStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    log::info!("Daybook bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[CONFIG] {}", e);
            std::process::exit(1);
        }
    };
    let clock = match config.clock() {
        Ok(clock) => clock,
        Err(e) => {
            log::error!("[CONFIG] {}", e);
            std::process::exit(1);
        }
    };
    let store = NoteStore::new(config.notes_dir.clone(), &config.template_subdir);
    log::info!(
        "[CONFIG] Notes in {:?}, UTC{:+}, day starts at {:02}:00",
        store.notes_dir(),
        config.timezone_offset_hours,
        config.day_start_hour
    );
    if let Err(e) = std::fs::create_dir_all(store.daily_dir()) {
        log::error!("[CONFIG] Cannot create {:?}: {}", store.daily_dir(), e);
        std::process::exit(1);
    }
    if !store.template_path().is_file() {
        log::warn!(
            "[CONFIG] Daily template {:?} not found; new notes use the built-in layout",
            store.template_path()
        );
    }
    log::info!("[NOTES] Today is {}", clock.today());

    let dispatcher = Arc::new(NoteDispatcher::new(store, clock, config.root_id));
    channels::telegram::run(config.bot_token, dispatcher).await;
}
