fn main() {
    if let Err(error) = xqe_cli::run() {
        // run() installs the subscriber right after argument parsing
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}
