use std::process::ExitCode;

fn main() -> ExitCode {
    fruitlink_cli::run()
}
