use crate::error::{MultitoonError, Result};
use crate::multitoon_error;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Check access to the resources the key tracker needs.
pub fn check_permissions() -> Result<()> {
    info!("Checking permissions...");
    check_input_devices_access(Path::new("/dev/input"))?;
    check_not_root();
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(MultitoonError::Permission(format!(
            "{} does not exist",
            input_dir.display()
        )));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Access to {} confirmed", input_dir.display());
            Ok(())
        }
        Err(e) => Err(multitoon_error!(
            permission,
            "Cannot read {}: {}. Add the user to the 'input' group",
            input_dir.display(),
            e
        )),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Running as root. xdotool will be invoked as $SUDO_USER when set");
            warn!("Prefer: sudo usermod -a -G input $USER (then log in again)");
        }
        Ok(user) => info!("Running as user {}", user),
        Err(_) => warn!("Could not determine the current user"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_dir_is_permission_error() {
        let result = check_input_devices_access(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(MultitoonError::Permission(_))));
    }

    #[test]
    fn test_readable_dir_passes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_input_devices_access(dir.path()).is_ok());
    }
}
