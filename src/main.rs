use clap::Parser;
use perch::core::config;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "perch", about = "Terminal client for a server-rendered social feed")]
struct Args {
    /// Site to talk to, e.g. http://localhost:8000
    #[arg(long)]
    base_url: Option<String>,

    /// Page whose list is shown, e.g. /feed
    #[arg(long)]
    path: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to perch.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("perch.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {e}, using defaults");
            log::warn!("Config load failed: {}", e);
            config::PerchConfig::default()
        }
    };
    let resolved = config::resolve(&file_config, args.base_url.as_deref(), args.path.as_deref());

    log::info!(
        "Perch starting up against {}{}",
        resolved.base_url,
        resolved.path
    );

    perch::tui::run(resolved)
}
