//! Ponder CLI binary: solve a range of task instances and print the accuracy summary.

use clap::Parser;
use cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("ponder", None::<&std::path::Path>).ok();
    let args = Args::parse();
    let _log_guard = config::logging::init("ponder", args.verbose)?;
    let defaults = config::load_defaults("ponder")?;

    match cli::execute(&args, &defaults).await {
        Ok(summary) => {
            println!(
                "{} instances: avg {:.4}, any {:.4}",
                summary.n, summary.avg_accuracy, summary.any_accuracy
            );
            println!("usage_so_far {}", serde_json::to_string(&summary.usage)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("ponder: {}", e);
            std::process::exit(1);
        }
    }
}
