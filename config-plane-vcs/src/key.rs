use std::path::{Component, Path};

use config_plane_core::ConfigError;

/// Validate that `key` is safe to use as a relative file path beneath the
/// working tree root (spec §3: "must be safe as a relative file path").
///
/// The original prototype didn't check this at all, so `set("../../etc/passwd", ...)`
/// would happily write outside the repo; this closes that off without
/// adding any feature the spec doesn't already require.
pub fn validate(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }

    let path = Path::new(key);
    if path.is_absolute() {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
            reason: "key must be a relative path".to_string(),
        });
    }

    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            other => {
                return Err(ConfigError::InvalidKey {
                    key: key.to_string(),
                    reason: format!("path component {other:?} is not allowed"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate("app").is_ok());
        assert!(validate("nested/key").is_ok());
    }

    #[test]
    fn rejects_escape_attempts() {
        assert!(validate("../outside").is_err());
        assert!(validate("a/../../b").is_err());
        assert!(validate("/etc/passwd").is_err());
        assert!(validate("").is_err());
    }
}
