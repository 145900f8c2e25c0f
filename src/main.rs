// src/main.rs

use respawn::engine::LoopExit;
use respawn::{cli, logging, run};

#[tokio::main]
async fn main() {
    // Exit explicitly: a pending stdin read would otherwise hold up runtime
    // shutdown.
    let code = match run_main().await {
        Ok(LoopExit::Stopped) => 0,
        // Mirror the worker's own status when it ended on its own.
        Ok(LoopExit::WorkerExited(exit)) => exit.and_then(|e| e.code()).unwrap_or(1),
        Err(err) => {
            eprintln!("respawn error: {err:?}");
            1
        }
    };
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<LoopExit> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
