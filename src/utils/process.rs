use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Run `command` through the platform shell and capture its output.
///
/// Stdin is inherited so interactive tools (microphone prompts, push-to-talk)
/// keep working.
pub fn run_shell_command(command: &str) -> Result<ProcessOutput> {
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    };

    #[cfg(not(target_os = "windows"))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    };

    let output = cmd
        .stdin(Stdio::inherit())
        .output()
        .with_context(|| format!("failed executing command: {command}"))?;

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
    })
}

/// Operating system name as reported by the standard library.
pub fn platform_name() -> &'static str {
    std::env::consts::OS
}

/// The program part of a shell command line (its first word).
pub fn program_name(command: &str) -> Option<&str> {
    command.split_whitespace().next()
}

/// Resolve a program the way the shell would: paths are checked directly,
/// bare names are searched on `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        candidates(&dir, program)
            .into_iter()
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(target_os = "windows")]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    ["", ".exe", ".cmd", ".bat"]
        .iter()
        .map(|ext| dir.join(format!("{program}{ext}")))
        .collect()
}

#[cfg(not(target_os = "windows"))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}
