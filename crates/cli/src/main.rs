use std::process::ExitCode;

fn main() -> ExitCode {
    match astref_cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("astref: {e}");
            ExitCode::FAILURE
        }
    }
}
