//! Secret values and the decoding indirection applied to configured secrets.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// A decoded secret. `Debug` and `Display` never reveal the value.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Turns a configured secret string into its usable value.
pub trait SecretResolver {
    fn resolve(&self, raw: &str) -> Result<Secret>;
}

/// Default secret decoding.
///
/// - `%env{NAME}` reads the environment variable `NAME`
/// - `base64:<data>` decodes standard base64
/// - anything else is used verbatim
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSecretResolver;

const ENV_PREFIX: &str = "%env{";
const BASE64_PREFIX: &str = "base64:";

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, raw: &str) -> Result<Secret> {
        let raw = raw.trim();

        if let Some(name) = raw
            .strip_prefix(ENV_PREFIX)
            .and_then(|rest| rest.strip_suffix('}'))
        {
            return std::env::var(name).map(Secret::new).map_err(|_| {
                Error::configuration(format!("environment variable '{name}' is not set"))
            });
        }

        if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| Error::configuration(format!("secret is not valid base64: {e}")))?;
            let value = String::from_utf8(bytes)
                .map_err(|_| Error::configuration("decoded secret is not UTF-8"))?;
            return Ok(Secret::new(value));
        }

        Ok(Secret::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_value_passes_through() {
        let secret = DefaultSecretResolver.resolve("hunter2").unwrap();
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn base64_value_is_decoded() {
        let secret = DefaultSecretResolver.resolve("base64:aHVudGVyMg==").unwrap();
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn bad_base64_is_a_configuration_error() {
        let err = DefaultSecretResolver.resolve("base64:***").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn env_reference_is_resolved() {
        let name = "VCS_GIT_SECRET_TEST_PATH";
        let expected = std::env::var("PATH").unwrap();
        let secret = DefaultSecretResolver.resolve("%env{PATH}").unwrap();
        assert_eq!(secret.expose(), expected);

        let err = DefaultSecretResolver
            .resolve(&format!("%env{{{name}}}"))
            .unwrap_err();
        assert!(err.to_string().contains(name));
    }

    #[test]
    fn debug_never_shows_value() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
    }
}
