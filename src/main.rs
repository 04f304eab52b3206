use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tenback::cli::{
    handle_backup_command, handle_list_command, handle_restore_command, handle_trim_command,
};
use tenback::config::{ProjectPaths, Settings};

#[derive(Parser)]
#[command(
    name = "tenback",
    version,
    about = "Backup, restore and retention for Odoo-style tenant databases",
    long_about = "tenback backs up a tenant's PostgreSQL database, its filestore and \
                  its addon directories as one artifact set, restores those artifacts, \
                  and trims old backups under a keep-last-N policy."
)]
struct Cli {
    /// Path to the odoo.conf-style configuration file
    #[arg(short, long, default_value = "conf/odoo.conf")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the database, filestore and addon directories
    Backup,

    /// Restore backup artifacts (database and/or addons)
    Restore {
        /// Artifact files, as paths or names in the backup directory
        #[arg(required = true)]
        files: Vec<String>,

        /// Treat the result as an independent copy: reset its identity and
        /// skip neutralization
        #[arg(long)]
        copy: bool,

        /// Extract addons artifacts into this directory instead of the one
        /// encoded in the filename
        #[arg(long)]
        addons_to: Option<PathBuf>,
    },

    /// Trim old backups of the configured database
    Trim {
        /// Number of backups to keep per group
        #[arg(long, default_value_t = 10)]
        keep: usize,
    },

    /// Trim old backups of every database found
    Trimall {
        /// Number of backups to keep per group
        #[arg(long, default_value_t = 10)]
        keep: usize,
    },

    /// List backup artifacts
    List,

    /// Show the resolved configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let root = std::env::current_dir()?;
    let paths = ProjectPaths::new(root, &settings);

    match cli.command {
        Commands::Backup => {
            handle_backup_command(&settings, &paths)?;
        }
        Commands::Restore {
            files,
            copy,
            addons_to,
        } => {
            handle_restore_command(&settings, &paths, &files, copy, addons_to.as_deref())?;
        }
        Commands::Trim { keep } => {
            handle_trim_command(&settings, &paths, keep, false)?;
        }
        Commands::Trimall { keep } => {
            handle_trim_command(&settings, &paths, keep, true)?;
        }
        Commands::List => {
            handle_list_command(&paths)?;
        }
        Commands::Config => {
            println!("tenback configuration");
            println!("=====================");
            println!("Config file:      {}", cli.config.display());
            println!("Database:         {}", settings.db_name);
            println!(
                "Server:           {}:{} (user {})",
                settings.db_host, settings.db_port, settings.db_user
            );
            println!("Password:         ********");
            println!("Template:         {}", settings.db_template);
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Addon directories:");
            for dir in paths.addon_dirs() {
                println!("  {}", dir.display());
            }
        }
    }

    Ok(())
}
