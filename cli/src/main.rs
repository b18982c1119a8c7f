use anyhow::Context;
use clap::Parser;
use xcpatch_cli::{CONFIRMATION, Cli, exit_code_for, exit_codes, init_logging, run};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = std::env::current_dir()
        .context("failed to determine the current directory")
        .and_then(|cwd| run(&cli, &cwd).map(|outcome| (cwd, outcome)));

    let code = match result {
        Ok((cwd, outcome)) if outcome.dry_run => {
            print!("{}", outcome.diff(&cwd));
            exit_codes::SUCCESS
        }
        Ok(_) => {
            println!("{CONFIRMATION}");
            exit_codes::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}
