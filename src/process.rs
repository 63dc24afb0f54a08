//! Structured invocation of external tools.
//!
//! Both external collaborators (the markup converter and the paginated-image
//! transcoder) are synchronous, blocking child processes. Every call site
//! consumes the same structured outcome instead of inspecting exit codes ad
//! hoc: success is `Ok(())`, and every failure mode — program not found,
//! spawn error, non-zero exit — collapses into one [`ToolFailure`] carrying
//! a human-readable diagnostic.

use std::ffi::OsStr;
use std::process::Command;
use tracing::debug;

/// A failed external tool invocation.
///
/// Carries the program name and a one-line diagnostic (stderr excerpt or OS
/// error). Callers map this into their own recoverable error class.
#[derive(Debug, Clone)]
pub struct ToolFailure {
    pub program: String,
    pub detail: String,
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.program, self.detail)
    }
}

/// Run an external tool to completion, capturing its output.
///
/// Blocks until the child exits; there is no timeout (a hung tool hangs the
/// run, acceptable for batch/offline usage). stderr is captured and folded
/// into the failure diagnostic, truncated to keep log lines readable.
pub fn run_tool<I, S>(program: &str, args: I) -> Result<(), ToolFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!("Running external tool: {:?}", command);

    let output = command.output().map_err(|e| {
        let detail = if e.kind() == std::io::ErrorKind::NotFound {
            "program not found on PATH".to_string()
        } else {
            e.to_string()
        };
        ToolFailure {
            program: program.to_string(),
            detail,
        }
    })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let excerpt = first_line(stderr.trim());
    let detail = match (output.status.code(), excerpt.is_empty()) {
        (Some(code), true) => format!("exited with status {code}"),
        (Some(code), false) => format!("exited with status {code}: {excerpt}"),
        (None, _) => "terminated by signal".to_string(),
    };
    Err(ToolFailure {
        program: program.to_string(),
        detail,
    })
}

// Truncation counts characters, not bytes: tool stderr quotes document
// content, so multibyte text is ordinary and a byte slice could split a
// character.
fn first_line(s: &str) -> &str {
    let line = s.lines().next().unwrap_or("");
    match line.char_indices().nth(200) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_on_zero_exit() {
        run_tool("true", std::iter::empty::<&str>()).expect("`true` should succeed");
    }

    #[test]
    fn failure_on_nonzero_exit() {
        let err = run_tool("false", std::iter::empty::<&str>()).unwrap_err();
        assert_eq!(err.program, "false");
        assert!(err.detail.contains("status 1"), "got: {}", err.detail);
    }

    #[test]
    fn missing_program_is_reported() {
        let err = run_tool("tex2epub-no-such-tool", ["--version"]).unwrap_err();
        assert!(err.detail.contains("not found"), "got: {}", err.detail);
    }

    #[test]
    fn stderr_excerpt_respects_char_boundaries() {
        // 301 bytes but only 151 characters; a byte-indexed cut would land
        // inside the multibyte 'é'.
        let multibyte = format!("x{}", "é".repeat(150));
        let excerpt = first_line(&multibyte);
        assert_eq!(excerpt, multibyte);

        let long_multibyte = "é".repeat(250);
        let excerpt = first_line(&long_multibyte);
        assert_eq!(excerpt.chars().count(), 200);
        assert!(long_multibyte.starts_with(excerpt));
    }

    #[test]
    fn stderr_excerpt_truncates_long_ascii_lines() {
        let long = "a".repeat(500);
        assert_eq!(first_line(&long).len(), 200);
    }
}
