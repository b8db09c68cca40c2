use std::process::ExitCode;

mod app;
mod logging;

fn main() -> ExitCode {
    let args = reshard::cli::parse();
    match app::run(args) {
        Ok(code) => code,
        Err(e) => {
            reshard::output::print_error(&format!("{e:#}"));
            ExitCode::from(app::EXIT_FATAL)
        }
    }
}
