//! Techblog CLI.
//!
//! Provides commands for:
//! - `render`: Render a post body (diagrams, sanitization, image placeholders)
//! - `scan`: List diagram blocks in a post body without rendering them
//! - `posts`: List posts from the blog API

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GlobalArgs, PostsArgs, RenderArgs, ScanArgs};
use output::Output;

/// Techblog - render and inspect blog posts.
#[derive(Parser)]
#[command(name = "tb", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a post body to HTML.
    Render(RenderArgs),
    /// List diagram blocks found in a post body.
    Scan(ScanArgs),
    /// List posts from the blog API.
    Posts(PostsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Scan(args) => args.execute(&cli.global),
        Commands::Posts(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
