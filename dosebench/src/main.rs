mod cli;
mod exit_codes;
mod output;
mod run_error;
mod session;

use clap::Parser;
use mimalloc::MiMalloc;

use crate::exit_codes::ExitCode;
use crate::run_error::RunError;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DOSEBENCH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success.as_i32(),
                _ => ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    init_tracing();

    let session = async move {
        match cli.command {
            cli::Command::Http(args) => session::http(args).await,
            cli::Command::Exec(args) => session::exec(args).await,
            cli::Command::Compare(args) => session::compare(args).await,
        }
    };

    let result: Result<ExitCode, RunError> = tokio::select! {
        res = session => res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\ninterrupted by user");
            Ok(ExitCode::Interrupted)
        }
    };

    let code = match result {
        Ok(code) => code.as_i32(),
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}
