// src/main.rs

use sitegen::report::ExitStatus;
use sitegen::{cli, logging, run};

#[tokio::main]
async fn main() {
    let status = match run_main().await {
        Ok(status) => status,
        Err(err) => {
            eprintln!("sitegen error: {err:?}");
            ExitStatus::Failure
        }
    };
    std::process::exit(status.code());
}

async fn run_main() -> anyhow::Result<ExitStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
