// src/process/launcher.rs

//! Pluggable worker spawning.
//!
//! The supervisor talks to a `WorkerLauncher` instead of building commands
//! itself. Production code uses [`CommandLauncher`]; tests wrap it to inject
//! spawn failures without touching the supervisor.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Child;

/// Trait abstracting how a worker process is created.
///
/// `launch` is called once per startup and once per reload, always with the
/// same target and arguments.
pub trait WorkerLauncher: Send + Sync + 'static {
    fn launch(&self) -> std::io::Result<Child>;

    /// Human-readable description used in logs and errors.
    fn describe(&self) -> String;
}

/// Spawns a program with fixed arguments.
///
/// On Unix the child becomes the leader of a new process group so that
/// signals reach everything it forks. Stdout and stderr are inherited so
/// worker output stays visible.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    /// Run `script` through the platform shell.
    pub fn shell(script: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(script)
        } else {
            Self::new("sh").arg("-c").arg(script)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl WorkerLauncher for CommandLauncher {
    fn launch(&self) -> std::io::Result<Child> {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut cmd = tokio::process::Command::from(cmd);
        cmd.kill_on_drop(true);
        cmd.spawn()
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}
