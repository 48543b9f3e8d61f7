pub mod serve;

use clap::{Parser, Subcommand};

use crate::auth::hash_password;

#[derive(Parser)]
#[command(name = "client-contract-api")]
#[command(about = "Client and contract management API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides API_PORT")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store even when DATABASE_URL is set")]
        memory: bool,
    },

    #[command(about = "Run the startup initializer (schema wait and seed) and exit")]
    Seed {
        #[arg(long, help = "Seed even when SEED_ENABLED is false")]
        force: bool,
    },

    #[command(about = "Print the bcrypt hash of a password for an AUTH_USERS entry")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,

        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, help = "bcrypt work factor (4-31)")]
        cost: u32,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        memory: false,
    }) {
        Commands::Serve { port, memory } => serve::serve(port, memory).await,
        Commands::Seed { force } => serve::seed(force).await,
        Commands::HashPassword { password, cost } => {
            println!("{}", hash_password(&password, cost)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["client-contract-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from(["client-contract-api", "serve", "--port", "9090", "--memory"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port, memory }) => {
                assert_eq!(port, Some(9090));
                assert!(memory);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_hash_password() {
        let cli = Cli::try_parse_from(["client-contract-api", "hash-password", "secret"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::HashPassword { password, cost }) if password == "secret" && cost == bcrypt::DEFAULT_COST
        ));

        let cli = Cli::try_parse_from(["client-contract-api", "hash-password", "secret", "--cost", "10"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::HashPassword { cost: 10, .. })));
    }

    #[tokio::test]
    async fn hash_password_rejects_bad_cost() {
        let cli = Cli::try_parse_from(["client-contract-api", "hash-password", "secret", "--cost", "2"]).unwrap();
        assert!(run(cli).await.is_err());
    }
}
