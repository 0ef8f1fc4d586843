use colored::Colorize;

pub fn main() {
    if let Err(error) = pbiq_cli::run() {
        eprintln!("{} {:#}", "error:".red().bold(), error);
        std::process::exit(1);
    }
}
