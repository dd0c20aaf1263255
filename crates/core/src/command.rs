//! Argument-vector process invocation.
//!
//! [`CommandLine`] is the single place where toolshed spawns child processes.
//! Every argument is passed to the child as exactly one argv entry, so no
//! shell is involved and nothing needs quoting. Empty and absent arguments
//! are dropped while the command is built, which lets callers pass optional
//! flags inline.
//!
//! The rendered, shell-quoted form of a command ([`CommandLine::render`]) is
//! only used for logs and error messages, so a failing invocation can be
//! copied into a terminal and reproduced by hand.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{Span, debug, info};

use crate::{Error, Result};

/// A value that contributes zero or one argument to a [`CommandLine`].
///
/// `None` and empty strings contribute nothing.
pub trait IntoArg {
    /// Convert into an argv entry, or `None` to drop the argument.
    fn into_arg(self) -> Option<OsString>;
}

fn non_empty(value: OsString) -> Option<OsString> {
    if value.is_empty() { None } else { Some(value) }
}

impl IntoArg for &str {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.into())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.into())
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.into())
    }
}

impl IntoArg for &OsStr {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.to_os_string())
    }
}

impl IntoArg for OsString {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self)
    }
}

impl IntoArg for &Path {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.as_os_str().to_os_string())
    }
}

impl IntoArg for PathBuf {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.into_os_string())
    }
}

impl IntoArg for &PathBuf {
    fn into_arg(self) -> Option<OsString> {
        non_empty(self.as_os_str().to_os_string())
    }
}

impl<T: IntoArg> IntoArg for Option<T> {
    fn into_arg(self) -> Option<OsString> {
        self.and_then(IntoArg::into_arg)
    }
}

/// A program plus its arguments, ready to run.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    stdout: Option<PathBuf>,
    span: Span,
}

impl CommandLine {
    /// Start building a command for `program`.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
            stdout: None,
            span: Span::current(),
        }
    }

    /// Append one argument; empty or absent values are skipped.
    #[must_use]
    pub fn arg(mut self, arg: impl IntoArg) -> Self {
        if let Some(arg) = arg.into_arg() {
            self.args.push(arg);
        }
        self
    }

    /// Append several arguments; empty or absent values are skipped.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.args
            .extend(args.into_iter().filter_map(IntoArg::into_arg));
        self
    }

    /// Run the child in `dir` instead of the current working directory.
    ///
    /// Only the child is affected; the working directory of this process is
    /// never changed.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Send the child's stdout to `path` (created or truncated).
    #[must_use]
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Emit this command's log events under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The arguments, after empty and absent values were dropped.
    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Render as a single shell-quoted string, for logs and error messages.
    #[must_use]
    pub fn render(&self) -> String {
        let words: Vec<String> = std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| word.to_string_lossy().into_owned())
            .collect();
        shlex::try_join(words.iter().map(String::as_str))
            .unwrap_or_else(|_| words.join(" "))
    }

    /// Run the command to completion.
    ///
    /// stdout and stderr are inherited unless stdout was redirected with
    /// [`stdout_to`](Self::stdout_to).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started and
    /// [`Error::ProcessFailure`] if it exits unsuccessfully.
    pub fn run(&self) -> Result<()> {
        let _entered = self.span.enter();
        let rendered = self.render();
        let cwd = match &self.current_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_default(),
        };
        info!(command = %rendered, cwd = %cwd.display(), "Running command");
        debug!(args = ?self.args, "Command arguments");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        if let Some(path) = &self.stdout {
            let file = File::create(path)
                .map_err(|e| Error::io(e, Some(path), "creating stdout redirect"))?;
            command.stdout(Stdio::from(file));
        }

        let started = Instant::now();
        let status = command.status().map_err(|source| Error::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if !status.success() {
            return Err(Error::process_failure(rendered, status.code()));
        }

        info!(
            command = %rendered,
            elapsed_ms = started.elapsed().as_millis(),
            "Command succeeded"
        );
        Ok(())
    }

    /// Run the command and report only whether it exited successfully.
    ///
    /// Output is discarded. Used for verify probes.
    #[must_use]
    pub fn probe(&self) -> bool {
        let _entered = self.span.enter();
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        let ok = command.status().is_ok_and(|s| s.success());
        debug!(command = %self.render(), ok, "Probe finished");
        ok
    }
}
