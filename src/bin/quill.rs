use quill::run;
use std::process::exit;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        exit(1);
    }
}
