use clap::Parser;
use ragify_cli::{CliArgs, RagifyCli};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let app = match RagifyCli::from_args(&args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = app.run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
