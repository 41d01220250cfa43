//! CLI entry point for mdx-corpus

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdx_corpus::commands::new::NewDocument;
use mdx_corpus::Site;

#[derive(Parser)]
#[command(name = "mdx-corpus")]
#[command(version)]
#[command(about = "Parse, index and render a corpus of Markdown/MDX articles", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus and write JSON output
    #[command(alias = "b")]
    Build {
        /// Rebuild whenever a source file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Report every problem in the corpus without writing output
    Check,

    /// Create a new document
    New {
        /// Title of the new document
        title: String,

        /// One-line summary (defaults to the title)
        #[arg(short, long, default_value = "")]
        summary: String,

        /// Tags, repeatable
        #[arg(short, long)]
        tag: Vec<String>,

        /// Mark as draft
        #[arg(long)]
        draft: bool,

        /// File name without extension
        #[arg(short, long)]
        path: Option<String>,
    },

    /// List corpus content
    List {
        /// Type of content to list (post, draft, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Remove the public folder
    Clean,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdx_corpus=debug,info"
    } else {
        "mdx_corpus=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read current directory")?,
    };

    match cli.command {
        Commands::Build { watch } => {
            let site = Site::new(&base_dir)?;
            cancel_on_interrupt(&site)?;
            tracing::info!("Building {:?}", site.source_dir);

            let result = site.generate();
            if watch {
                if let Err(e) = result {
                    tracing::error!("Build failed: {:#}", e);
                }
                mdx_corpus::commands::build::watch(&site)?;
            } else {
                let build = result?;
                println!("Built {} documents", build.outputs.len());
            }
        }

        Commands::Check => {
            let site = Site::new(&base_dir)?;
            cancel_on_interrupt(&site)?;
            let report = mdx_corpus::commands::check::run(&site)?;
            println!("{}", report);
            if report.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::New {
            title,
            summary,
            tag,
            draft,
            path,
        } => {
            let site = Site::new(&base_dir)?;
            let file = mdx_corpus::commands::new::create(
                &site,
                NewDocument {
                    title,
                    summary,
                    tags: tag,
                    draft,
                    path,
                },
            )?;
            println!("Created: {:?}", file);
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            mdx_corpus::commands::list::run(&site, &r#type)?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("mdx-corpus version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Ctrl+C cancels the running build and ends `--watch`
fn cancel_on_interrupt(site: &Site) -> Result<()> {
    let flag = site.cancel_handle();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl+C handler")?;
    Ok(())
}
