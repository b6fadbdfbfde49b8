use api_matrix_runner::{cli, infra::logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse command line arguments
    let cli_args = cli::parse_args();
    logging::init_logging(cli_args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Process the command
    let result = runtime.block_on(cli::process_command(cli_args));
    // A pause or confirm prompt may still be blocked on stdin.
    runtime.shutdown_background();

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
