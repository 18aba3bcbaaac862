use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use billcycle::{Commands, Container, ContainerConfig, Router};

#[derive(Parser)]
#[command(name = "billcycle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.billcycle")]
    data_dir: String,

    /// Keep everything in memory; nothing survives the process
    #[arg(long, global = true)]
    memory_storage: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    if !cli.memory_storage {
        std::fs::create_dir_all(&data_dir)?;
    }

    let today = match &cli.command {
        Commands::Generate { today, .. } => *today,
        _ => None,
    };

    let container = Container::new(ContainerConfig {
        data_dir,
        memory_storage: cli.memory_storage,
        today,
        show_progress: !cli.verbose,
    })
    .await?;

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn generate_accepts_today_and_dry_run() {
        let cli = Cli::try_parse_from(["billcycle", "generate", "--today", "2024-03-15", "--dry-run"])
            .expect("parse");
        match cli.command {
            Commands::Generate { today, dry_run } => {
                assert_eq!(today.map(|d| d.to_string()).as_deref(), Some("2024-03-15"));
                assert!(dry_run);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_rejects_malformed_today() {
        let res = Cli::try_parse_from(["billcycle", "generate", "--today", "15/03/2024"]);
        assert!(res.is_err());
    }

    #[test]
    fn invoices_month_must_be_year_month() {
        assert!(Cli::try_parse_from(["billcycle", "invoices", "--month", "2024-03"]).is_ok());
        assert!(Cli::try_parse_from(["billcycle", "invoices", "--month", "2024-3-1"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["billcycle", "stats", "--memory-storage", "-v"])
            .expect("parse");
        assert!(cli.memory_storage);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, "~/.billcycle");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/billcycle"), "/var/lib/billcycle");
    }
}
