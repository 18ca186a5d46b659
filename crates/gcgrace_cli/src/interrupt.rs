use std::process;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::report::EXIT_INTERRUPTED;

/// What to do on a Ctrl-C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the in-flight statement finish, skip the remaining tables.
    Cancel,
    /// Stop the process now.
    Exit,
}

/// Counts interrupts for one run. The first one cancels the token, any
/// later one exits.
#[derive(Debug)]
pub struct Interrupts {
    cancel: CancellationToken,
    seen: u32,
}

impl Interrupts {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel, seen: 0 }
    }

    pub fn on_interrupt(&mut self) -> InterruptAction {
        self.seen += 1;
        if self.seen == 1 {
            self.cancel.cancel();
            InterruptAction::Cancel
        } else {
            InterruptAction::Exit
        }
    }
}

pub fn spawn_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut interrupts = Interrupts::new(cancel);
        while tokio::signal::ctrl_c().await.is_ok() {
            match interrupts.on_interrupt() {
                InterruptAction::Cancel => warn!(
                    "Interrupted: finishing the in-flight statement, skipping remaining tables \
                     (Ctrl-C again to exit now)"
                ),
                InterruptAction::Exit => {
                    eprintln!("gcgrace: interrupted twice, exiting without waiting");
                    process::exit(EXIT_INTERRUPTED);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interrupt_cancels_second_exits() {
        let cancel = CancellationToken::new();
        let mut interrupts = Interrupts::new(cancel.clone());

        assert_eq!(interrupts.on_interrupt(), InterruptAction::Cancel);
        assert!(cancel.is_cancelled());
        assert_eq!(interrupts.on_interrupt(), InterruptAction::Exit);
        assert_eq!(interrupts.on_interrupt(), InterruptAction::Exit);
    }
}
