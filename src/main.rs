use agentstudio::cli::{Cli, Commands, ConfigAction};
use agentstudio::config::{resolve_config_snapshot_hash, validate_config, validate_config_object, Config};
use agentstudio::logging;
use agentstudio::server::StudioServer;
use agentstudio::store::DbManager;
use clap::Parser;
use tracing::{info, warn};

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = Config::load(path)?;
    logging::init(&config.logging);

    let hash = resolve_config_snapshot_hash(&serde_json::to_value(&config)?);
    match &config.source {
        Some(source) => info!("Loaded configuration from {} ({})", source.display(), &hash[..12]),
        None => info!("Using default configuration ({})", &hash[..12]),
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            let config = load_config(opts.config.as_deref())?;
            for err in validate_config(&config) {
                warn!("Config {}: {}", err.path, err.message);
            }
            info!("Starting agentstudio API server");
            let server = StudioServer::start(config, &opts).await?;
            server.run_until_shutdown().await?;
        }
        Commands::InitDb(opts) => {
            let config = load_config(opts.config.as_deref())?;
            let path = config.database_path();
            let db = DbManager::open(&path)?;
            db.create_db_and_tables()?;
            info!("Database ready at {}", path.display());
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                let config = load_config(opts.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                let config = load_config(opts.config.as_deref())?;
                validate_config_object(&config)?;
                info!("Configuration is valid");
            }
            ConfigAction::Init => {
                let path = opts.config.as_deref().unwrap_or("agentstudio.json");
                Config::write_default(path)?;
                println!("Configuration file created at {path}");
            }
        },
        Commands::Version => {
            println!("agentstudio {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
