mod app;
mod config;
mod generator;
mod logger;
mod template;
mod worker;

use app::App;
use std::{env, error::Error};

fn main() -> Result<(), Box<dyn Error>> {
    let config_path = env::args()
        .find(|arg| arg.starts_with("--config="))
        .map(|arg| arg.trim_start_matches("--config=").to_string())
        .unwrap_or_else(|| "config.toml".to_string());

    let app = match App::new(&config_path) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to load configuration '{}': {}", config_path, e);
            return Err(e);
        }
    };

    app.run()
}
