use std::path::Path;

use crate::error::SessionError;
use crate::settings::{read_settings, write_settings};

const USERNAME: &str = "admin";
const PASSWORD: &str = "admin";

/// Check the fixed credential and persist the authenticated flag.
pub fn login(data_dir: &Path, username: &str, password: &str) -> Result<(), SessionError> {
    if username.trim() != USERNAME || password != PASSWORD {
        log::warn!("rejected login for '{}'", username.trim());
        return Err(SessionError::InvalidCredentials);
    }
    let mut settings = read_settings(data_dir);
    settings.authenticated = true;
    write_settings(data_dir, &settings)?;
    log::info!("logged in as {USERNAME}");
    Ok(())
}

pub fn logout(data_dir: &Path) -> Result<(), SessionError> {
    let mut settings = read_settings(data_dir);
    if settings.authenticated {
        settings.authenticated = false;
        write_settings(data_dir, &settings)?;
        log::info!("logged out");
    }
    Ok(())
}

pub fn is_authenticated(data_dir: &Path) -> bool {
    read_settings(data_dir).authenticated
}

pub fn require_authenticated(data_dir: &Path) -> Result<(), SessionError> {
    if is_authenticated(data_dir) {
        Ok(())
    } else {
        Err(SessionError::NotAuthenticated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::persist::tests::create_temp_dir;
    use crate::settings::read_settings;

    #[test]
    fn login_logout_cycle() {
        let dir = create_temp_dir("ecorecycle-session");
        assert!(matches!(
            require_authenticated(&dir),
            Err(SessionError::NotAuthenticated)
        ));

        assert!(matches!(
            login(&dir, "admin", "wrong"),
            Err(SessionError::InvalidCredentials)
        ));
        assert!(!is_authenticated(&dir));

        login(&dir, "admin", "admin").unwrap();
        require_authenticated(&dir).unwrap();

        logout(&dir).unwrap();
        assert!(!is_authenticated(&dir));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn login_keeps_other_settings() {
        let dir = create_temp_dir("ecorecycle-session-keep");
        let mut settings = read_settings(&dir);
        settings.set_theme("amber").unwrap();
        crate::settings::write_settings(&dir, &settings).unwrap();

        login(&dir, "admin", "admin").unwrap();
        let after = read_settings(&dir);
        assert_eq!(after.theme, "amber");
        assert!(after.authenticated);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
