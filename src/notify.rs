use colored::Colorize;

/// Sink for the single user-facing line an update check produces.
pub trait Notifier {
    fn success(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes to stderr, leaving stdout to the host application.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        eprintln!("{}", message.green());
    }

    fn info(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    fn error(&self, message: &str) {
        eprintln!("{}: {}", "ERROR".red(), message);
    }
}
