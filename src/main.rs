use std::sync::Arc;

use clap::Parser;

use zaplinker::cli::{Cli, Commands};
use zaplinker::config::StaticConfig;
use zaplinker::runtime::modes::{run_cli, run_server};
use zaplinker::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Arc::new(StaticConfig::load(cli.config.as_deref()));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let _guard = init_logging(&config.logging)?;
            run_server(config).await
        }
        cmd => {
            if let Err(e) = run_cli(cmd, config).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
