fn main() {
    if let Err(err) = datagrab::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
