#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = tvnav_cli::run_from_env() {
        eprintln!("tvnav: {error}");
        std::process::exit(error.exit_code());
    }
}
