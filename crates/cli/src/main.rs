use std::process::ExitCode;

fn main() -> ExitCode {
    membership_cli::run()
}
