use clap::Parser;
use metalcorr::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
