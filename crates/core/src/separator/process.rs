//! Driving a separator executable as a child process.

use regex_lite::Regex;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::error::SeparationError;

/// Lines of combined output kept for error reports.
const OUTPUT_TAIL_LINES: usize = 20;

/// Runs `program args..` to completion, logging its output as it arrives.
///
/// A `timeout_secs` of `None` lets the process run unbounded. On expiry the
/// child is killed and `SeparationError::Timeout` returned.
pub(crate) async fn run_tool(
    tool: &str,
    program: &Path,
    args: &[String],
    timeout_secs: Option<u64>,
) -> Result<(), SeparationError> {
    let start = Instant::now();
    debug!(tool, program = %program.display(), ?args, "Spawning separator process");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| not_found_or_io(e, program))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_task = stdout.map(|s| tokio::spawn(collect_output(tool.to_string(), s)));
    let stderr_task = stderr.map(|s| tokio::spawn(collect_output(tool.to_string(), s)));

    let status = match timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(SeparationError::Timeout { timeout_secs: secs });
            }
        },
        None => child.wait().await?,
    };

    let mut tail = String::new();
    for task in [stdout_task, stderr_task].into_iter().flatten() {
        if let Ok(lines) = task.await {
            tail.push_str(&lines);
        }
    }

    if !status.success() {
        return Err(SeparationError::process_failed(tool, status.code(), tail));
    }

    info!(
        tool,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Separator process finished"
    );
    Ok(())
}

/// Runs `program args..` and only checks that it starts and exits cleanly.
pub(crate) async fn probe_tool(program: &Path, args: &[&str]) -> Result<(), SeparationError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| not_found_or_io(e, program))?;

    if !output.status.success() {
        return Err(SeparationError::process_failed(
            program.display().to_string(),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    Ok(())
}

fn not_found_or_io(e: std::io::Error, program: &Path) -> SeparationError {
    if e.kind() == std::io::ErrorKind::NotFound {
        SeparationError::ToolNotFound {
            path: program.to_path_buf(),
        }
    } else {
        SeparationError::Io(e)
    }
}

/// Logs each line, tracks progress percentages and returns the last lines.
///
/// Reads raw bytes to EOF so the child never blocks on a closed pipe, and
/// treats `\r` as a line break for redrawn progress bars.
async fn collect_output<R: AsyncRead + Unpin>(tool: String, stream: R) -> String {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut tail = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
    let percent_regex = Regex::new(r"(\d{1,3})%\|").ok();
    let mut last_logged_percent = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(tool = %tool, error = %e, "Stopped reading separator output");
                break;
            }
        }

        let text = String::from_utf8_lossy(&buf);
        for segment in text.split(['\r', '\n']).filter(|s| !s.trim().is_empty()) {
            if let Some(percent) = percent_regex.as_ref().and_then(|re| parse_percent(re, segment))
            {
                if should_log_progress(last_logged_percent, percent) {
                    info!(tool = %tool, percent, "Separation progress");
                    last_logged_percent = Some(percent);
                }
            } else {
                debug!(tool = %tool, "{}", segment);
            }

            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(segment.to_string());
        }
    }

    tail.into_iter().collect::<Vec<_>>().join("\n")
}

/// Extracts the latest percentage from progress bar output such as ` 45%|████`.
fn parse_percent(re: &Regex, line: &str) -> Option<u8> {
    let caps = re.captures_iter(line).last()?;
    let value = caps.get(1)?.as_str().parse::<u8>().ok()?;
    (value <= 100).then_some(value)
}

fn should_log_progress(last: Option<u8>, current: u8) -> bool {
    match last {
        None => true,
        Some(last) => current == 100 || current >= last.saturating_add(10) || current < last,
    }
}
