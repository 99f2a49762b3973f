use argumentrx_cli::cli::Cli;
use argumentrx_cli::telemetry::{init_tracing, level_for};
use argumentrx_cli::run;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json, level_for(cli.verbose));

    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    match run(&cli, &cwd) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
