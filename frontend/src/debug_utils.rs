// Scroll events fire dozens of times per second; logging each one floods
// the dev server log. Route high-frequency logs through `debug_throttled`.

use std::sync::atomic::{AtomicUsize, Ordering};

static LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
const LOGS_PER_WINDOW: usize = 5;
const WINDOW_SIZE: usize = 100;

/// Prints the first 5 of every 100 calls. The message is only built for
/// calls that get printed.
pub fn debug_throttled<F>(message: F)
where
    F: FnOnce() -> String,
{
    let count = LOG_COUNT.fetch_add(1, Ordering::Relaxed) % WINDOW_SIZE;
    match throttle_action(count) {
        ThrottleAction::Print => zoon::println!("[THROTTLED] {}", message()),
        ThrottleAction::AnnounceLimit => {
            zoon::println!("[THROTTLED] Log rate limit reached, suppressing further messages...")
        }
        ThrottleAction::Drop => {}
    }
}

#[derive(Debug, PartialEq)]
enum ThrottleAction {
    Print,
    AnnounceLimit,
    Drop,
}

fn throttle_action(count_in_window: usize) -> ThrottleAction {
    if count_in_window < LOGS_PER_WINDOW {
        ThrottleAction::Print
    } else if count_in_window == LOGS_PER_WINDOW {
        ThrottleAction::AnnounceLimit
    } else {
        ThrottleAction::Drop
    }
}

/// Always prints. For errors and important state changes only.
pub fn debug_critical(message: &str) {
    zoon::println!("[CRITICAL] {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_start_of_each_window_is_printed() {
        assert_eq!(throttle_action(0), ThrottleAction::Print);
        assert_eq!(throttle_action(LOGS_PER_WINDOW - 1), ThrottleAction::Print);
        assert_eq!(throttle_action(LOGS_PER_WINDOW), ThrottleAction::AnnounceLimit);
        assert_eq!(throttle_action(WINDOW_SIZE - 1), ThrottleAction::Drop);
    }

    #[test]
    fn dropped_calls_never_build_their_message() {
        // Push the counter past the printed part of the current window.
        let position = LOG_COUNT.load(Ordering::Relaxed) % WINDOW_SIZE;
        let skip = (WINDOW_SIZE + LOGS_PER_WINDOW + 1 - position) % WINDOW_SIZE;
        LOG_COUNT.fetch_add(skip, Ordering::Relaxed);

        let mut built = false;
        debug_throttled(|| {
            built = true;
            String::new()
        });
        assert!(!built);
    }
}
