use clap::Parser;

use emma_ia_transfer::cli::{self, Cli};
use emma_ia_transfer::config::env_flag;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if env_flag("DEBUG", false) { "debug" } else { "info" };
        tracing_subscriber::EnvFilter::new(level)
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli::run(cli).await {
        Ok(report) => {
            if report.ran_pipeline() {
                println!();
                println!("{} SUBMISSIONS PROCESSED", report.total_processed());
            }
            std::process::exit(0);
        }
        Err(error) => {
            eprintln!("[ERROR] Transfer run failed: {error}");
            std::process::exit(1);
        }
    }
}
