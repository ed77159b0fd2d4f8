use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` kalau proses dihentikan sinyal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Menjalankan program eksternal (docker). Di test diganti perekam.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], stdin: Option<Vec<u8>>) -> Result<CommandOutput>;
}

pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String], stdin: Option<Vec<u8>>) -> Result<CommandOutput> {
        log::debug!("$ {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });

        let mut child = cmd.spawn()?;
        // stdin ditulis paralel dengan pembacaan stdout/stderr, supaya tidak saling tunggu
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(tokio::spawn(async move {
                pipe.write_all(&input).await
                // pipe di-drop di sini supaya proses dapat EOF
            })),
            _ => None,
        };

        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            match writer.await.map_err(|e| io::Error::new(io::ErrorKind::Other, e))? {
                Ok(()) => {}
                // proses selesai tanpa membaca seluruh stdin
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    log::debug!("{} menutup stdin lebih awal", program)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Seperti [`CommandRunner::run`], tapi exit non-zero jadi [`Error::CommandFailed`].
pub async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    stdin: Option<Vec<u8>>,
) -> Result<CommandOutput> {
    let output = runner.run(program, args, stdin).await?;
    if output.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    log::error!("{} {} gagal: {}", program, args.join(" "), stderr);
    Err(Error::CommandFailed {
        program: format!("{} {}", program, args.first().map(String::as_str).unwrap_or("")).trim().to_string(),
        status: output.code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        stderr,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn run_checked_maps_failure_to_error() {
        let runner = RecordingRunner::with_replies(vec![failed(1, "no such image\n")]);
        let args = vec!["push".to_string(), "ns/tgbot:latest".to_string()];
        let err = run_checked(&runner, "docker", &args, None).await.unwrap_err();
        match err {
            Error::CommandFailed { program, status, stderr } => {
                assert_eq!(program, "docker push");
                assert_eq!(status, "1");
                assert_eq!(stderr, "no such image");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn system_runner_pipes_stdin() {
        let args = vec!["-c".to_string(), "cat".to_string()];
        let output = SystemRunner.run("sh", &args, Some(b"halo".to_vec())).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"halo");
    }

    #[tokio::test]
    async fn large_stdin_and_stdout_do_not_block_each_other() {
        // tulis 256 KiB dulu sebelum mulai membaca stdin
        let args = vec!["-c".to_string(), "head -c 262144 /dev/zero; cat > /dev/null".to_string()];
        let input = vec![b'x'; 262_144];
        let output = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            SystemRunner.run("sh", &args, Some(input)),
        )
        .await
        .expect("runner macet")
        .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 262_144);
    }
}
