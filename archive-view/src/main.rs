use anyhow::Result;
use archive_view::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    archive_view::run(cli, &mut stdout).await
}
