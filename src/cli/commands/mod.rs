//! Command implementations for wellkeep.
//!
//! Each command returns the text to print; `main` prints it.

mod caffeine;
mod fasting;
mod session;
mod sleep;
mod slot;
mod sync;
mod todo;

pub use caffeine::caffeine;
pub use fasting::fasting;
pub use session::{login, logout};
pub use sleep::sleep;
pub use slot::{field, get, set};
pub use sync::{migrate, sync};
pub use todo::todo;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;

/// Execute `completions`
#[must_use]
pub fn completions(shell: Shell) -> String {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    let mut buffer = Vec::new();
    clap_complete::generate(shell, &mut command, name, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_mention_subcommands() {
        let script = completions(Shell::Bash);
        assert!(script.contains("wellkeep"));
        assert!(script.contains("fasting"));
    }
}
