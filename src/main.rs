use dotenvy::dotenv;
use tracing::{error, info};

mod config;
mod generation;
mod handlers;
mod llm;
mod models;
mod settings;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use config::CONFIG;
use generation::GenerationClient;
use handlers::access::ensure_access;
use handlers::commands::{self, Command};
use llm::HttpTransport;
use settings::{ConfigResolver, FileSettingsStore};
use utils::logging::init_logging;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = run(&args).await {
        error!("Command failed: {err}");
        eprintln!("{err}");
        drop(guards);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let parsed = commands::parse_args(args)?;
    if parsed.command == Command::Help {
        println!("{}", commands::usage());
        return Ok(());
    }

    ensure_access(&CONFIG.site_password, parsed.password.as_deref())?;

    let store = FileSettingsStore::open(&CONFIG.settings_path);
    info!("Using settings file {}", store.path().display());
    let resolver = ConfigResolver::load(CONFIG.defaults.clone(), store);

    match parsed.command {
        Command::Generate(generate_args) => {
            let client = GenerationClient::new(HttpTransport::new(), CONFIG.providers.clone());
            commands::run_generate(&client, &resolver, generate_args).await
        }
        Command::SettingsShow => {
            commands::run_settings_show(&resolver);
            Ok(())
        }
        Command::SettingsSet(overrides) => commands::run_settings_set(&resolver, overrides),
        Command::Help => Ok(()),
    }
}
