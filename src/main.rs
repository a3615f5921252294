// src/main.rs

use flowgate::{cli, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("flowgate error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    run(args).await
}
