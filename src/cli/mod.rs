use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentstudio", version, about = "Multi-agent workflow builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the REST API.
    Serve(ServeOpts),
    /// Create the database and its tables.
    InitDb(InitDbOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(clap::Args)]
pub struct InitDbOpts {
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::parse_from(["agentstudio", "serve", "--port", "9000", "--host", "0.0.0.0"]);
        match cli.command {
            Commands::Serve(opts) => {
                assert_eq!(opts.port, Some(9000));
                assert_eq!(opts.host.as_deref(), Some("0.0.0.0"));
                assert!(opts.config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_config_action() {
        let cli = Cli::parse_from(["agentstudio", "config", "-c", "studio.toml", "validate"]);
        match cli.command {
            Commands::Config(opts) => {
                assert_eq!(opts.config.as_deref(), Some("studio.toml"));
                assert!(matches!(opts.action, ConfigAction::Validate));
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn init_db_is_kebab_case() {
        let cli = Cli::parse_from(["agentstudio", "init-db"]);
        assert!(matches!(cli.command, Commands::InitDb(_)));
    }
}
