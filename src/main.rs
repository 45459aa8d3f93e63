use clap::Parser;
use cors_server::config::Config;
use cors_server::{logger, server, CorsServer, ServerError};
use std::process::ExitCode;

/// Serve the current directory over HTTP with permissive CORS and
/// cache-disabling headers.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Port to listen on [default: 9999]
    #[arg(value_parser = clap::value_parser!(u16))]
    port: Option<u16>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match Config::load(cli.port) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg.logging) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|&w| w > 0) {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config) -> Result<(), ServerError> {
    let server = CorsServer::bind(cfg)?;
    let addr = server.local_addr()?;

    println!("Starting CORS-enabled HTTP server on port {}...", addr.port());
    logger::log_server_start(&addr, &server.state().root, &server.state().config);

    tokio::select! {
        () = server.serve_forever() => {}
        () = server::shutdown_signal() => logger::log_shutdown(),
    }

    Ok(())
}
