use std::io::{self, Write};

/// Transient user feedback for store mutations. Implementations present
/// the message and forget it; nothing is persisted.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, is_error: bool);
}

/// Writes one acknowledgment line to stderr so it never mixes with
/// rendered catalog output on stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, is_error: bool) {
        let tag = if is_error { "!" } else { "*" };
        // Feedback is best effort; a closed stderr is not worth failing over.
        let _ = writeln!(io::stderr(), "{tag} {message}");
    }
}
