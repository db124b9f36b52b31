use std::process::ExitCode;

fn main() -> ExitCode {
    laundryops_cli::run()
}
