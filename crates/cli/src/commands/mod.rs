//! Command implementations.
//!
//! Each command drives the storefront library and prints the resulting view
//! to stdout. Feedback the library raises through its notifier is printed
//! after the operation.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

use thiserror::Error;

use petalshop_storefront::{ClientError, Storefront};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storefront operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Reading from the terminal failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Print the notification the last operation raised, if still visible.
#[allow(clippy::print_stdout)]
pub fn print_notification(store: &Storefront) {
    let notification = store.notifier().current();
    if notification.visible {
        let mark = if notification.success { "✔" } else { "✖" };
        println!("{mark} {}", notification.message);
    }
}
