use natwire_cli::{init_tracing, run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("natwire: {}", err);
            ExitCode::FAILURE
        }
    }
}
