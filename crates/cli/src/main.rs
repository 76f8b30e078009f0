use std::process::ExitCode;

fn main() -> ExitCode {
    dockbook_cli::run()
}
