use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    playground_cli::run().await
}
