//! Cancellable external program execution

use std::ffi::OsString;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{DeployError, Result};

/// Run `program args...`, feeding `input` to stdin, and return its stdout
///
/// The child is killed if `cancel` fires before it exits. A non-zero exit
/// status is an error carrying the captured stderr.
pub(crate) async fn run(
    program: &str,
    args: &[OsString],
    input: Option<Vec<u8>>,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let command_line = display_command(program, args);

    if cancel.is_cancelled() {
        return Err(DeployError::Cancelled {
            program: program.to_string(),
        });
    }

    tracing::debug!(command = %command_line, "running");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| DeployError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(input)) = (stdin, input) {
            match pipe.write_all(&input).await {
                // The program may legitimately exit without reading everything
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        Ok::<(), std::io::Error>(())
    };

    let finished = async move {
        let ((), output) = tokio::try_join!(feed, child.wait_with_output())?;
        Ok::<_, std::io::Error>(output)
    };

    let output = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::warn!(command = %command_line, "cancelled, killing process");
            return Err(DeployError::Cancelled {
                program: program.to_string(),
            });
        }
        result = finished => result.map_err(|source| DeployError::Spawn {
            program: program.to_string(),
            source,
        })?,
    };

    if !output.status.success() {
        return Err(DeployError::CommandFailed {
            command: command_line,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

fn display_command(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run("sh", &args(&["-c", "printf 'kind: A\\n'"]), None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, b"kind: A\n");
    }

    #[tokio::test]
    async fn test_feeds_stdin() {
        let out = run(
            "sh",
            &args(&["-c", "cat"]),
            Some(b"kind: B\n".to_vec()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(out, b"kind: B\n");
    }

    #[tokio::test]
    async fn test_program_ignoring_stdin_succeeds() {
        let input = vec![b'x'; 1 << 20];
        let out = run("true", &[], Some(input), &CancellationToken::new())
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = run(
            "sh",
            &args(&["-c", "echo boom >&2; exit 3"]),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            DeployError::CommandFailed {
                command,
                code,
                stderr,
            } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run(
            "kdeploy-test-no-such-program",
            &[],
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeployError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_spawn() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run("kdeploy-test-no-such-program", &[], None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_cancel_kills_running_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = run("sleep", &args(&["30"]), None, &cancel).await.unwrap_err();

        assert!(matches!(err, DeployError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
