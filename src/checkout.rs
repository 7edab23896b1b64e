//! Version-control checkouts for objects hosted directly in a repository
//!
//! The retriever only needs two operations: a fresh clone into an empty
//! directory and an in-place update of an existing one. [`GitCheckout`]
//! shells out to `git`; tests substitute their own [`Checkout`].

use crate::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};

pub trait Checkout {
    /// Clone `uri` into `dest`, which does not exist yet
    fn clone_fresh(&self, uri: &str, dest: &Path) -> Result<()>;

    /// Bring the existing checkout at `dest` up to date with `uri`
    fn update(&self, uri: &str, dest: &Path) -> Result<()>;
}

/// Checkout backend driving the `git` command line
#[derive(Debug, Clone)]
pub struct GitCheckout {
    program: String,
}

impl GitCheckout {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, command: &mut Command, action: &str, uri: &str) -> Result<()> {
        command
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Checkout(format!(
                    "'{}' was not found. Install git or set [checkout] program in o3de_fetch.toml",
                    self.program
                ))
            } else {
                Error::Checkout(format!("failed to spawn {} {}: {}", self.program, action, e))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Checkout(format!(
                "{} {} of {} failed ({}): {}",
                self.program,
                action,
                uri,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Checkout for GitCheckout {
    fn clone_fresh(&self, uri: &str, dest: &Path) -> Result<()> {
        tracing::info!(uri = %uri, dest = %dest.display(), "cloning");
        let mut command = Command::new(&self.program);
        command.arg("clone").arg(uri).arg(dest);
        self.run(&mut command, "clone", uri)
    }

    fn update(&self, uri: &str, dest: &Path) -> Result<()> {
        tracing::info!(uri = %uri, dest = %dest.display(), "updating checkout");
        let mut command = Command::new(&self.program);
        command.arg("-C").arg(dest).arg("pull").arg("--ff-only");
        self.run(&mut command, "pull", uri)
    }
}
