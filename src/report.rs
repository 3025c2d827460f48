use std::io::{self, BufRead, Write};

use gridcal_core::SyncReporter;

/// Reporter for interactive runs: alerts to stderr, confirmations read
/// from stdin unless `--yes` pre-answered them.
pub struct TerminalReporter {
    pub assume_yes: bool,
}

impl SyncReporter for TerminalReporter {
    fn alert(&self, message: &str) {
        eprintln!("⚠️  {message}");
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            println!("{message} (answered yes via --yes)");
            return true;
        }

        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}
