use std::process::ExitCode;
use std::sync::Arc;

use getter::cli::{self, CliCommand};
use getter::config::{AppState, Config};
use getter::error::StartupError;
use getter::files;
use getter::logger;
use getter::server;

fn main() -> ExitCode {
    let folder = match cli::parse_args(std::env::args().skip(1)) {
        Ok(CliCommand::Run(folder)) => folder,
        Ok(CliCommand::Help) => {
            println!("{}", cli::USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&folder) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(folder: &str) -> Result<(), StartupError> {
    let data_root = files::resolve_data_root(folder)?;
    let cfg = Config::load()?;
    let addr = cfg.get_socket_addr()?;

    logger::init(&cfg).map_err(StartupError::Logger)?;
    logger::install_panic_hook();

    // Size the runtime from `server.workers`, defaulting to one thread per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers.max(1));
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async move {
        let listener = server::create_listener(addr)?;
        logger::log_server_start(&addr, &data_root, &cfg);

        let state = Arc::new(AppState::new(cfg, data_root));
        server::start_server_loop(listener, state, server::wait_for_shutdown()).await?;
        Ok::<(), StartupError>(())
    })
}

/// Usage and data directory problems go to stdout; everything later is logged
fn report(err: &StartupError) {
    match err {
        StartupError::Argument(_)
        | StartupError::PathResolution(_)
        | StartupError::InvalidDataRoot { .. } => println!("{err}"),
        _ => logger::log_error(&err.to_string()),
    }
}
