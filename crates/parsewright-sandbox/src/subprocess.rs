//! Subprocess-backed sandbox

use crate::config::{SandboxConfig, SandboxConfigError};
use crate::decode::decode_output;
use crate::group::ProcessGroup;
use parsewright_domain::traits::Sandbox;
use parsewright_domain::{ExecutionFault, TabularResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Bytes of stderr kept for fault reports
const STDERR_CAP: usize = 64 * 1024;

/// Lines of stderr included in a fault report
const STDERR_TAIL_LINES: usize = 15;

/// Runs candidates in a fresh scratch directory under an interpreter subprocess
#[derive(Debug, Clone)]
pub struct SubprocessSandbox {
    config: SandboxConfig,
}

impl SubprocessSandbox {
    /// Create a sandbox, validating the configuration
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn command(&self, script: &Path, document: &Path, workdir: &Path) -> Command {
        let (program, args) = match self.config.interpreter.split_first() {
            Some((program, args)) => (program.as_str(), args),
            None => ("python3", &[][..]),
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(script)
            .arg(document)
            .current_dir(workdir)
            .env_clear()
            .env("HOME", workdir)
            .env("TMPDIR", workdir)
            .env("LANG", "C.UTF-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }
        for key in &self.config.env_allowlist {
            if let Some(value) = std::env::var_os(key) {
                cmd.env(key, value);
            }
        }
        cmd
    }

    /// Write the script and copy the document into the scratch directory
    async fn stage(
        &self,
        workdir: &Path,
        source: &str,
        document: &Path,
    ) -> Result<(PathBuf, PathBuf), ExecutionFault> {
        let script = workdir.join(format!("candidate.{}", self.config.script_extension));
        tokio::fs::write(&script, source)
            .await
            .map_err(|e| ExecutionFault::Spawn(format!("failed to write candidate script: {}", e)))?;

        let file_name = document
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document".into());
        let document_copy = workdir.join(file_name);
        tokio::fs::copy(document, &document_copy).await.map_err(|e| {
            ExecutionFault::Spawn(format!(
                "failed to stage document {}: {}",
                document.display(),
                e
            ))
        })?;

        Ok((script, document_copy))
    }
}

impl Sandbox for SubprocessSandbox {
    async fn execute(&self, source: &str, document: &Path) -> Result<TabularResult, ExecutionFault> {
        if source.trim().is_empty() {
            return Err(ExecutionFault::EmptySource);
        }

        let workdir = tempfile::Builder::new()
            .prefix("parsewright-sandbox-")
            .tempdir()
            .map_err(|e| ExecutionFault::Spawn(format!("failed to create scratch directory: {}", e)))?;
        let (script, document_copy) = self.stage(workdir.path(), source, document).await?;

        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut child = self
            .command(&script, &document_copy, workdir.path())
            .spawn()
            .map_err(|e| ExecutionFault::Spawn(format!("{}: {}", self.config.interpreter.join(" "), e)))?;
        let mut group = ProcessGroup::new(child.id());

        let limit = self.config.max_output_bytes;
        let mut stdout = tokio::spawn(read_capped(child.stdout.take(), limit));
        let mut stderr = tokio::spawn(read_capped(child.stderr.take(), STDERR_CAP));

        let status = match timeout_at(deadline, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                group.kill();
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed-out candidate");
                }
                stdout.abort();
                stderr.abort();
                return Err(ExecutionFault::TimedOut {
                    limit: self.config.timeout(),
                });
            }
        };

        // Background processes left behind would hold the pipes open
        group.kill();

        let drained = timeout_at(deadline, async { tokio::join!(&mut stdout, &mut stderr) }).await;
        let (stdout, stderr) = match drained {
            Ok(parts) => parts,
            Err(_) => {
                stdout.abort();
                stderr.abort();
                return Err(ExecutionFault::TimedOut {
                    limit: self.config.timeout(),
                });
            }
        };

        let (stdout, overflow) = stdout
            .map_err(|e| ExecutionFault::Spawn(format!("candidate stdout reader failed: {}", e)))?
            .map_err(|e| ExecutionFault::Spawn(format!("failed to read candidate stdout: {}", e)))?;
        let stderr = match stderr {
            Ok(Ok((bytes, _))) => bytes,
            _ => Vec::new(),
        };
        let status = status
            .map_err(|e| ExecutionFault::Spawn(format!("failed to wait for candidate: {}", e)))?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = stdout.len(),
            status = ?status.code(),
            "candidate finished"
        );

        if overflow {
            return Err(ExecutionFault::OutputTooLarge { limit_bytes: limit });
        }
        if !status.success() {
            return Err(ExecutionFault::Crashed {
                exit_code: status.code(),
                stderr_tail: stderr_tail(&stderr),
            });
        }

        decode_output(&stdout)
    }

    fn script_extension(&self) -> &str {
        &self.config.script_extension
    }
}

/// Read at most `cap` bytes; the flag reports whether more were available
async fn read_capped<R>(reader: Option<R>, cap: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok((Vec::new(), false));
    };

    let mut buf = Vec::new();
    reader.take(cap as u64 + 1).read_to_end(&mut buf).await?;
    let overflow = buf.len() > cap;
    buf.truncate(cap);
    Ok((buf, overflow))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "(no stderr output)".to_string()
    } else {
        tail
    }
}
