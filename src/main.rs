use std::process::ExitCode;

fn main() -> ExitCode {
    match ecorecycle_lib::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
