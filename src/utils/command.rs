/// Process execution helpers shared by the tool descriptors
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured output of a finished process
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Return stdout if the process succeeded, otherwise error with stderr
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            anyhow::bail!("{}", self.stderr.trim())
        }
    }
}

/// Builder for running external programs with piped output
pub struct CommandBuilder {
    command: Command,
    context_msg: Option<String>,
}

impl CommandBuilder {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut command = Command::new(program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Self {
            command,
            context_msg: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Set an environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.command.env(key, val);
        self
    }

    /// Set KUBECONFIG environment variable
    pub fn kubeconfig(self, path: &Path) -> Self {
        self.env("KUBECONFIG", path)
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput> {
        let output = if let Some(ctx) = &self.context_msg {
            self.command.output().await.context(ctx.clone())?
        } else {
            self.command.output().await?
        };
        Ok(CommandOutput::from_output(output))
    }

    /// Execute and ignore output (just check success)
    pub async fn run_silent(self) -> Result<()> {
        self.output().await?.into_result().map(|_| ())
    }

    /// Execute a program that may not exist.
    ///
    /// Returns `Ok(None)` when the program cannot be found or is not
    /// executable. Any other spawn failure is an error.
    pub async fn probe(mut self) -> Result<Option<CommandOutput>> {
        match self.command.output().await {
            Ok(output) => Ok(Some(CommandOutput::from_output(output))),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                Ok(None)
            }
            Err(e) => {
                let ctx = self
                    .context_msg
                    .unwrap_or_else(|| "Failed to execute command".to_string());
                Err(anyhow::Error::new(e).context(ctx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_builder_basic() {
        let result = CommandBuilder::new("echo")
            .arg("test")
            .context("Testing echo command")
            .output()
            .await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("test"));
    }

    #[tokio::test]
    async fn test_command_builder_kubeconfig() {
        let output = CommandBuilder::new("sh")
            .arg("-c")
            .arg("echo $KUBECONFIG")
            .kubeconfig(Path::new("/tmp/kubeconfig"))
            .output()
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout.trim(), "/tmp/kubeconfig");
    }

    #[tokio::test]
    async fn test_into_result_reports_stderr() {
        let err = CommandBuilder::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .output()
            .await
            .unwrap()
            .into_result()
            .unwrap_err();

        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_probe_missing_program() {
        let output = CommandBuilder::new("kubekit-definitely-not-a-real-program")
            .arg("version")
            .probe()
            .await
            .unwrap();

        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_probe_runs_program() {
        let output = CommandBuilder::new("pwd")
            .probe()
            .await
            .unwrap()
            .expect("pwd should exist");

        assert!(output.success);
        assert!(!output.stdout.trim().is_empty());
    }
}
