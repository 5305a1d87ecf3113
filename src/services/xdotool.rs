use crate::error::{MultitoonError, Result};
use crate::multitoon_error;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Outcome of one xdotool invocation
#[derive(Debug)]
pub struct XdotoolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    // Reading /dev/input often needs sudo; X11 calls still have to reach the user's session
    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            debug!("Running xdotool as desktop user {}", sudo_user);
            env_vars.insert("USER".to_string(), sudo_user);
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

fn create_command(args: &[&str]) -> Command {
    let mut cmd = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
        let mut cmd = Command::new("sudo");
        cmd.args(["-E", "-u", &sudo_user, "xdotool"]);
        cmd.args(args);
        cmd
    } else {
        let mut cmd = Command::new("xdotool");
        cmd.args(args);
        cmd
    };

    for (key, value) in build_env_overrides() {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null()).kill_on_drop(true);
    cmd
}

/// Run xdotool with `args`. Spawn failures (binary missing) are errors;
/// a non-zero exit is reported through `XdotoolOutput::success`.
pub async fn run(args: &[&str]) -> Result<XdotoolOutput> {
    let output = create_command(args).output().await.map_err(|e| {
        debug!("xdotool could not be started: {}", e);
        MultitoonError::ServiceUnavailable(format!("xdotool not available: {}", e))
    })?;

    Ok(XdotoolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Check that xdotool can be started and talks to an X server.
pub async fn probe() -> Result<()> {
    let output = run(&["getactivewindow"]).await?;
    if output.success {
        Ok(())
    } else {
        Err(multitoon_error!(service_unavailable, "xdotool getactivewindow failed: {}", output.stderr))
    }
}
