//! Shell-based workers for process tests.

use respawn::process::CommandLauncher;

/// Sleeps for `secs` seconds, then exits 0.
pub fn sleeper(secs: u64) -> CommandLauncher {
    CommandLauncher::shell(format!("exec sleep {secs}"))
}

/// Sleeps for `secs` seconds, then exits with `code`.
pub fn exits_after(secs: u64, code: i32) -> CommandLauncher {
    CommandLauncher::shell(format!("sleep {secs}; exit {code}"))
}

/// Ignores SIGTERM, so only SIGKILL ends it.
pub fn stubborn(secs: u64) -> CommandLauncher {
    CommandLauncher::shell(format!("trap '' TERM; sleep {secs}"))
}

/// A program that cannot be spawned.
pub fn missing() -> CommandLauncher {
    CommandLauncher::new("/nonexistent/respawn-test-worker")
}
