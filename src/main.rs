use repomirror::ui::output;

fn main() {
    if let Err(err) = repomirror::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
