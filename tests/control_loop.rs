// tests/control_loop.rs
#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use respawn::engine::{CommandQueue, ControlLoop, LoopExit, LoopOptions};
use respawn::errors::RespawnError;
use respawn::process::{CommandLauncher, ProcessSupervisor, SupervisorOptions};
use respawn::types::Command;
use respawn_test_utils::{init_tracing, wait_until, with_timeout, workers};

fn control(launcher: CommandLauncher) -> ControlLoop<CommandLauncher> {
    let supervisor = Arc::new(ProcessSupervisor::new(launcher, SupervisorOptions::default()));
    ControlLoop::new(supervisor, CommandQueue::new(), LoopOptions::default())
}

#[tokio::test]
async fn unsupervised_exit_ends_the_loop() {
    init_tracing();
    let control = control(workers::exits_after(1, 42));
    let supervisor = Arc::clone(control.supervisor());

    let exit = with_timeout(control.run()).await.unwrap();

    let LoopExit::WorkerExited(Some(result)) = exit else {
        panic!("expected the worker's own exit, got {exit:?}");
    };
    assert_eq!(result.code(), Some(42));
    assert!(!supervisor.is_alive().await);
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn stop_command_finishes_the_loop() {
    init_tracing();
    let control = control(workers::sleeper(30));
    let supervisor = Arc::clone(control.supervisor());
    let sender = control.sender();
    let handle = control.spawn();

    assert!(wait_until(Duration::from_secs(5), || supervisor.pid().is_some()).await);
    sender.send(Command::Stop).unwrap();

    let exit = with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(exit, LoopExit::Stopped);
    assert!(!supervisor.is_running());
    assert_eq!(supervisor.pid(), None);
}

#[tokio::test]
async fn commands_are_applied_in_order() {
    init_tracing();
    let control = control(workers::sleeper(30));
    let supervisor = Arc::clone(control.supervisor());
    let sender = control.sender();
    let handle = control.spawn();

    assert!(wait_until(Duration::from_secs(5), || supervisor.is_running()).await);
    let first_pid = supervisor.pid();

    sender.send(Command::Pause).unwrap();
    assert!(wait_until(Duration::from_secs(5), || supervisor.is_paused()).await);

    // A paused worker is not an unsupervised exit; the loop keeps waiting.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished());
    assert!(supervisor.is_paused());

    sender.send(Command::Resume).unwrap();
    sender.send(Command::Reload).unwrap();
    assert!(wait_until(Duration::from_secs(5), || supervisor.generation() == 2).await);
    assert!(!supervisor.is_paused());
    assert_ne!(supervisor.pid(), first_pid);

    sender.send(Command::Stop).unwrap();
    let exit = with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(exit, LoopExit::Stopped);
}

#[tokio::test]
async fn failing_commands_do_not_stop_the_loop() {
    init_tracing();
    let control = control(workers::sleeper(30));
    let supervisor = Arc::clone(control.supervisor());
    let sender = control.sender();

    // Queued ahead of the initial STARTUP, so there is nothing to pause yet.
    control.enqueue(Command::Pause);
    control.enqueue(Command::Startup);
    let handle = control.spawn();

    assert!(wait_until(Duration::from_secs(5), || supervisor.is_running()).await);
    assert!(!supervisor.is_paused());

    sender.send(Command::Stop).unwrap();
    let exit = with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(exit, LoopExit::Stopped);
}

#[tokio::test]
async fn startup_failure_propagates_out_of_run() {
    init_tracing();
    let control = control(workers::missing());

    let err = with_timeout(control.run()).await.unwrap_err();
    assert!(matches!(err, RespawnError::Spawn { .. }));
}
