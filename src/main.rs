use colored::Colorize;

fn main() {
    match kanban_migrate::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "❌".bright_red(), e);
            std::process::exit(1);
        }
    }
}
