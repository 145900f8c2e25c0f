// src/worker.rs

//! Helpers for Rust workers running under respawn.
//!
//! A worker binary can wrap its async entry point in [`run`]:
//!
//! ```no_run
//! fn main() -> respawn::errors::Result<()> {
//!     respawn::worker::run(async {
//!         // serve until the supervisor stops us
//!     })
//! }
//! ```
//!
//! Every termination signal the worker can receive is logged, then the
//! default disposition is restored and the signal re-raised, so the
//! supervisor sees the same exit it would without the handlers.

use std::future::Future;

use tracing::{debug, info};

use crate::errors::Result;

/// Build a Tokio runtime, install signal logging and drive `main` to
/// completion.
pub fn run<F>(main: F) -> Result<F::Output>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        install_signal_logging()?;
        Ok(main.await)
    })
}

/// Status a process reports when it ends because of signal `signo`.
pub fn signal_exit_code(signo: i32) -> i32 {
    128 + signo
}

fn log_signal(name: &'static str) {
    info!(signal = name, pid = std::process::id(), "worker received signal; exiting");
}

/// Die from `sig` as if it had never been handled.
#[cfg(unix)]
fn reraise(sig: nix::sys::signal::Signal) -> ! {
    use nix::sys::signal::{SigHandler, raise, signal};

    log_signal(sig.as_str());
    // SAFETY: installing SIG_DFL runs no user code in signal context.
    if let Err(e) = unsafe { signal(sig, SigHandler::SigDfl) } {
        debug!(error = %e, "failed to restore default signal disposition");
    } else if let Err(e) = raise(sig) {
        debug!(error = %e, "failed to re-raise signal");
    }
    // Only reached if the signal could not end us.
    std::process::exit(signal_exit_code(sig as i32))
}

/// Register logging handlers for the termination signals.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn install_signal_logging() -> Result<()> {
    use nix::sys::signal::Signal;
    use tokio::signal::unix::{SignalKind, signal};

    let hooked = [
        Signal::SIGINT,
        Signal::SIGTERM,
        Signal::SIGABRT,
        Signal::SIGHUP,
        Signal::SIGQUIT,
    ];

    for sig in hooked {
        let mut stream = signal(SignalKind::from_raw(sig as i32))?;
        tokio::spawn(async move {
            if stream.recv().await.is_some() {
                reraise(sig);
            }
        });
    }

    debug!(signals = ?hooked, "worker signal logging installed");
    debug!("SIGKILL cannot be intercepted; a killed worker exits without logging");
    Ok(())
}

#[cfg(windows)]
pub fn install_signal_logging() -> Result<()> {
    use tokio::signal::windows;

    // Console control events have no numeric signal; mirror cmd.exe's
    // Ctrl-C status for all of them.
    const CONTROL_EXIT: i32 = 0xC000_013A_u32 as i32;

    macro_rules! hook {
        ($ctor:ident, $name:literal) => {{
            let mut stream = windows::$ctor()?;
            tokio::spawn(async move {
                if stream.recv().await.is_some() {
                    log_signal($name);
                    std::process::exit(CONTROL_EXIT);
                }
            });
        }};
    }

    hook!(ctrl_c, "CTRL_C");
    hook!(ctrl_break, "CTRL_BREAK");
    hook!(ctrl_close, "CTRL_CLOSE");
    hook!(ctrl_shutdown, "CTRL_SHUTDOWN");

    debug!("worker console control logging installed");
    Ok(())
}

#[cfg(not(any(unix, windows)))]
pub fn install_signal_logging() -> Result<()> {
    tracing::warn!("signal logging is not supported on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_returns_the_future_output() {
        let value = run(async { 21 * 2 }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn signal_exit_code_follows_shell_convention() {
        assert_eq!(signal_exit_code(15), 143);
        assert_eq!(signal_exit_code(2), 130);
    }

    #[cfg(unix)]
    #[test]
    fn handled_termination_still_reports_the_signal() {
        use std::os::unix::process::ExitStatusExt;
        use std::time::Duration;

        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        const CHILD_ENV: &str = "RESPAWN_WORKER_SIGNAL_CHILD";
        const NAME: &str = "worker::tests::handled_termination_still_reports_the_signal";

        if std::env::var_os(CHILD_ENV).is_some() {
            run(std::future::pending::<()>()).unwrap();
            return;
        }

        // Re-run this test binary filtered down to this test, as the worker.
        let mut child = std::process::Command::new(std::env::current_exe().unwrap())
            .args(["--exact", NAME, "--nocapture", "--test-threads=1"])
            .env(CHILD_ENV, "1")
            .stdout(std::process::Stdio::null())
            .spawn()
            .unwrap();
        std::thread::sleep(Duration::from_millis(1_000));

        kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
        let status = child.wait().unwrap();

        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
        assert_eq!(status.code(), None);
    }
}
