use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use wellkeep::cli::args::{Cli, Commands};
use wellkeep::cli::{commands, AppContext};
use wellkeep::config::{Config, Paths};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        print!("{}", commands::completions(*shell));
        return Ok(());
    }

    init_logging(&cli);

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(async_main(cli))
}

/// Log to stderr. `RUST_LOG` wins, then `-v`, then `logging.level`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.verbose {
            "debug".to_string()
        } else {
            Paths::resolve(cli.home.clone())
                .and_then(|paths| Config::load_from_path(&paths.config_file))
                .map(|config| config.logging.level)
                .unwrap_or_else(|_| "warn".to_string())
        };
        EnvFilter::new(format!("wellkeep={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn async_main(cli: Cli) -> Result<()> {
    let ctx = AppContext::open(cli.home.clone()).context("failed to open data directory")?;
    let format = cli.output;

    let output = match cli.command {
        Commands::Get { key } => commands::get(&ctx, &key, format).await?,
        Commands::Set { key, value } => commands::set(&ctx, &key, &value, format).await?,
        Commands::Field { key, field, value } => {
            commands::field(&ctx, &key, &field, &value, format).await?
        },
        Commands::Sleep(args) => commands::sleep(&ctx, args.command, format).await?,
        Commands::Caffeine(args) => commands::caffeine(&ctx, args.command, format).await?,
        Commands::Todo(args) => commands::todo(&ctx, args.command, format).await?,
        Commands::Fasting(args) => commands::fasting(&ctx, args.command, format).await?,
        Commands::Sync(args) => commands::sync(&ctx, args.command, format).await?,
        Commands::Migrate => commands::migrate(&ctx, format).await?,
        Commands::Login { account, token } => {
            commands::login(&ctx, &account, &token, format).await?
        },
        Commands::Logout => commands::logout(&ctx, format)?,
        Commands::Completions { shell } => commands::completions(shell),
    };

    if !output.is_empty() {
        println!("{output}");
    }

    // Sync failures never fail a command; they are reported here instead
    if let Some(error) = ctx.sync_error() {
        eprintln!("{}: {}", "warning".yellow().bold(), error);
    }
    Ok(())
}
