use std::process;

fn main() {
    if let Err(e) = tusk_runner::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(tusk_runner::error::exit_code_for(&e));
    }
}
