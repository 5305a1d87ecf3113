use super::r#trait::WindowQuery;
use crate::error::Result;
use crate::events::{WindowGeometry, WindowHandle};
use crate::multitoon_error;
use crate::services::xdotool;
use tracing::debug;

pub struct XdotoolWindowQuery;

impl XdotoolWindowQuery {
    pub fn new() -> Self {
        Self
    }

    async fn search(&self, flag: &str, pattern: &str) -> Result<Vec<WindowHandle>> {
        let output = xdotool::run(&["search", flag, pattern]).await?;

        // `search` exits 1 with empty output when nothing matches
        if !output.success && !output.stderr.is_empty() {
            return Err(multitoon_error!(
                discovery,
                "xdotool search {} '{}' failed: {}",
                flag,
                pattern,
                output.stderr
            ));
        }

        Ok(parse_handles(&output.stdout))
    }
}

fn parse_handles(stdout: &str) -> Vec<WindowHandle> {
    stdout
        .lines()
        .filter_map(|line| match line.parse::<WindowHandle>() {
            Ok(handle) => Some(handle),
            Err(_) => {
                debug!("Skipping unparsable xdotool line '{}'", line.trim());
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl WindowQuery for XdotoolWindowQuery {
    async fn list_windows(&self, class_name: &str) -> Result<Vec<WindowHandle>> {
        self.search("--class", class_name).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<WindowHandle>> {
        self.search("--name", name).await
    }

    async fn geometry(&self, handle: WindowHandle) -> Result<Option<WindowGeometry>> {
        let id = handle.to_string();
        let output = xdotool::run(&["getwindowgeometry", &id]).await?;
        if !output.success {
            debug!("getwindowgeometry {} failed: {}", handle, output.stderr);
            return Ok(None);
        }
        Ok(WindowGeometry::parse_xdotool(&output.stdout))
    }

    async fn focused_window(&self) -> Result<Option<WindowHandle>> {
        let output = xdotool::run(&["getactivewindow"]).await?;
        if !output.success {
            debug!("getactivewindow failed: {}", output.stderr);
            return Ok(None);
        }
        Ok(output.stdout.parse::<WindowHandle>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handles_skips_noise() {
        let handles = parse_handles("71303175\n\n71303180\nDefaulting to search window name\n");
        assert_eq!(handles, vec![WindowHandle(71303175), WindowHandle(71303180)]);
    }
}
