fn main() {
    if let Err(err) = lineage_drawio::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
