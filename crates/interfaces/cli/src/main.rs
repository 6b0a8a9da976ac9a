mod seed;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use fs2::FileExt;
use tracing_subscriber::EnvFilter;

use glyphdb_config::AppConfig;
use glyphdb_store::GlyphDb;

#[derive(Debug, Parser)]
#[command(name = "glyphdb", version, about = "Manage gGlyphs & dGlyphs")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactively create one glyph from stdin.
    #[command(name = "seed-g")]
    SeedG,
    /// Print all glyphs.
    #[command(name = "list-g")]
    ListG,
    /// Print all dream entries.
    #[command(name = "list-d")]
    ListD,
    /// Run the HTTP API.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let db = GlyphDb::open(&config.storage.data_dir);
    db.init_all().await?;

    match cli.command {
        Commands::SeedG => seed::run_seed_glyph(&db).await?,
        Commands::ListG => {
            let glyphs = db.list_glyphs().await?;
            for glyph in &glyphs {
                println!("  {}  {}", glyph.id, glyph.title);
            }
            println!("  ({} glyphs total)", glyphs.len());
        }
        Commands::ListD => {
            let dreams = db.list_dreams().await?;
            for dream in &dreams {
                println!(
                    "  {}  user={}  symbols={}  emotions={}",
                    dream.id,
                    dream.user_id,
                    dream.g_glyph_counts.len(),
                    dream.extracted_emotions.len()
                );
            }
            println!("  ({} dream entries total)", dreams.len());
        }
        Commands::Serve { addr } => {
            let bind_addr = addr.unwrap_or(config.server.bind_addr);
            let _lock = acquire_store_lock(Path::new(&config.storage.data_dir))?;
            glyphdb_server::serve(Arc::new(db), &bind_addr).await?;
        }
    }

    Ok(())
}

/// Hold an exclusive advisory lock on the data directory for the lifetime
/// of the server, so a second live process cannot mutate the collection
/// documents underneath it.
fn acquire_store_lock(data_dir: &Path) -> Result<fs::File> {
    fs::create_dir_all(data_dir)?;
    let lock_path = data_dir.join("glyphdb.lock");
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        bail!(
            "another glyphdb process is serving from {} (lock held on {})",
            data_dir.display(),
            lock_path.display()
        );
    }
    Ok(lock_file)
}
