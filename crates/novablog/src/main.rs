//! NovaBlog CLI - markdown notes to JSON for the blog client.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::{load_config, PathArgs};

#[derive(Parser)]
#[command(name = "novablog")]
#[command(about = "Export markdown notes to JSON for the NovaBlog client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to novablog.toml config file
    #[arg(short, long, default_value = "novablog.toml", env = "NOVABLOG_CONFIG")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file and content folders
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Export published notes to JSON
    Export {
        #[command(flatten)]
        paths: PathArgs,

        /// Abort on the first note that fails
        #[arg(long)]
        strict: bool,
    },

    /// List published posts
    List {
        /// Exported data directory
        #[arg(long, env = "NOVABLOG_OUTPUT_DIR")]
        data: Option<PathBuf>,

        /// Only posts with this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only posts whose title or summary contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one post
    Show {
        slug: String,

        /// Exported data directory
        #[arg(long, env = "NOVABLOG_OUTPUT_DIR")]
        data: Option<PathBuf>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Posts sharing tags with a post
    Related {
        slug: String,

        /// Exported data directory
        #[arg(long, env = "NOVABLOG_OUTPUT_DIR")]
        data: Option<PathBuf>,

        /// Number of posts to show
        #[arg(short, long, default_value_t = novablog_catalog::DEFAULT_RELATED_LIMIT)]
        limit: usize,
    },

    /// Tag usage counts
    Tags {
        /// Exported data directory
        #[arg(long, env = "NOVABLOG_OUTPUT_DIR")]
        data: Option<PathBuf>,

        /// Only the most used tags
        #[arg(long)]
        top: Option<usize>,
    },

    /// Preview the public directory
    Serve {
        /// Port to listen on (defaults to config or 4000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to serve (defaults to config or "public")
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Export now and again whenever notes or images change
        #[arg(short, long)]
        watch: bool,

        #[command(flatten)]
        paths: PathArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    if let Commands::Init { yes } = cli.command {
        return commands::init::run(&cli.config, yes);
    }

    let file = load_config(&cli.config)?;
    let data_dir = |data: Option<PathBuf>| data.unwrap_or_else(|| PathBuf::from(&file.paths.output));

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Export { paths, strict } => {
            commands::export::run(paths.resolve(&file, strict))?;
        }
        Commands::List {
            data,
            tag,
            search,
            json,
        } => {
            commands::query::list(&data_dir(data), tag.as_deref(), search.as_deref(), json)?;
        }
        Commands::Show { slug, data, json } => {
            commands::query::show(&data_dir(data), &slug, json)?;
        }
        Commands::Related { slug, data, limit } => {
            commands::query::related(&data_dir(data), &slug, limit)?;
        }
        Commands::Tags { data, top } => {
            commands::query::tags(&data_dir(data), top)?;
        }
        Commands::Serve {
            port,
            dir,
            watch,
            paths,
        } => {
            let port = port.unwrap_or(file.serve.port);
            let dir = dir.unwrap_or_else(|| PathBuf::from(&file.serve.dir));
            commands::serve::run(port, dir, watch, paths.resolve(&file, false)).await?;
        }
    }

    Ok(())
}
