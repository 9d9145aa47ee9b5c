//! Ctrl-C handling.
//!
//! The first Ctrl-C raises a flag the import loop checks between records. A
//! second one exits at once with status 130.
use std::sync::atomic::{AtomicUsize, Ordering};

static PRESSES: AtomicUsize = AtomicUsize::new(0);

pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Install the handler; a second call in the same process is an error.
pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if note_press(&PRESSES) {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        tracing::warn!("interrupt received; stopping after the current line (again to abort)");
    })
}

pub fn interrupted() -> bool {
    PRESSES.load(Ordering::SeqCst) > 0
}

/// Count a press; `true` once the operator has pressed twice.
fn note_press(presses: &AtomicUsize) -> bool {
    presses.fetch_add(1, Ordering::SeqCst) >= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_press_asks_for_exit() {
        let presses = AtomicUsize::new(0);
        assert!(!note_press(&presses));
        assert!(note_press(&presses));
        assert!(note_press(&presses));
    }
}
