use std::process::ExitCode;

fn main() -> ExitCode {
    standup_cli::run()
}
