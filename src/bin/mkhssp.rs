//! Command-line HSSP report builder.

fn main() {
    if let Err(err) = hsspd::cli::run() {
        eprintln!("mkhssp: {err:#}");
        std::process::exit(1);
    }
}
