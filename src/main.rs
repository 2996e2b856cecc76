use std::process::ExitCode;

use clap::Parser;

use hisstock_board::{app, cli::Cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_output = cli.log_output();
    if let Err(err) = logging::init_logging(cli.verbose, &log_output) {
        eprintln!("{err}");
    }

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            // The table has been torn down by now; make sure the reason reaches the terminal.
            if let logging::LogOutput::File(path) = &log_output {
                eprintln!("hisstock-board: {err} (log: {})", path.display());
            }
            ExitCode::FAILURE
        }
    }
}
