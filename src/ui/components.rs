//! Terminal output: change badges, startup banner and farewell line.

use colored::{ColoredString, Colorize};

use crate::sync::{ChangeEvent, ChangeKind, SyncMapping};

/// Colored label for a change kind.
pub fn badge(kind: ChangeKind) -> ColoredString {
    let label = format!(" {} ", kind);
    match kind {
        ChangeKind::Added => label.black().on_green(),
        ChangeKind::Modified => label.black().on_blue(),
        ChangeKind::Deleted => label.black().on_red(),
    }
}

/// One line per accepted change, printed before the change is applied.
pub fn print_change(event: &ChangeEvent) {
    println!("{} {}", badge(event.kind), event.path.display());
}

/// `Starting watch a -> b, c -> d`
pub fn banner_line(mappings: &[SyncMapping]) -> String {
    let pairs = mappings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Starting watch {}", pairs)
}

pub fn print_banner(mappings: &[SyncMapping]) {
    println!("{}", banner_line(mappings));
    println!("Press {} to exit.", "Ctrl+C".cyan());
}

pub fn print_farewell() {
    println!("{}", "Bye!".green().bold());
}
