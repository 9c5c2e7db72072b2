use std::io::{self, BufRead, Write};

use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("密码错误，请重试")]
    WrongPassword,
    #[error("需要访问密码")]
    MissingPassword,
}

pub fn requires_password(site_password: &str) -> bool {
    !site_password.is_empty()
}

/// An empty configured password disables the gate.
pub fn check_site_password(site_password: &str, supplied: Option<&str>) -> Result<(), AccessError> {
    if !requires_password(site_password) {
        return Ok(());
    }
    match supplied {
        None => Err(AccessError::MissingPassword),
        Some(value) if value == site_password => {
            info!("Site password accepted");
            Ok(())
        }
        Some(_) => {
            warn!("Rejected site password attempt");
            Err(AccessError::WrongPassword)
        }
    }
}

/// Uses the `--password` argument if given, otherwise asks on stdin.
pub fn ensure_access(site_password: &str, supplied: Option<&str>) -> anyhow::Result<()> {
    if !requires_password(site_password) {
        return Ok(());
    }
    if supplied.is_some() {
        return Ok(check_site_password(site_password, supplied)?);
    }

    print!("请输入访问密码: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let entered = line.trim_end_matches(['\r', '\n']);
    Ok(check_site_password(site_password, Some(entered))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_open_without_configured_password() {
        assert_eq!(check_site_password("", None), Ok(()));
        assert_eq!(check_site_password("", Some("anything")), Ok(()));
    }

    #[test]
    fn requires_exact_match() {
        assert_eq!(check_site_password("love", Some("love")), Ok(()));
        assert_eq!(
            check_site_password("love", Some("Love")),
            Err(AccessError::WrongPassword)
        );
        assert_eq!(
            check_site_password("love", None),
            Err(AccessError::MissingPassword)
        );
        assert_eq!(AccessError::WrongPassword.to_string(), "密码错误，请重试");
    }
}
