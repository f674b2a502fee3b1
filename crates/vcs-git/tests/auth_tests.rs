//! Authentication selection from settings

use rstest::rstest;
use vcs_git::{
    AuthSettings, AuthStrategy, AuthenticationContext, AuthenticationResolver, ErrorKind,
    ProxySettings, ProxyType, Secret, SecretResolver, SyncSettings,
};

fn settings(remote: &str, auth: AuthSettings) -> SyncSettings {
    SyncSettings {
        remote_url: Some(remote.to_string()),
        auth,
        ..Default::default()
    }
}

fn credentials() -> AuthSettings {
    AuthSettings {
        username: Some("deploy".into()),
        password: Some("hunter2".into()),
        ..Default::default()
    }
}

fn key_file() -> AuthSettings {
    AuthSettings {
        ssh_key_file: Some("/home/app/.ssh/id_ed25519".into()),
        ..Default::default()
    }
}

#[rstest]
#[case::https_with_credentials("https://host/repo.git", credentials(), AuthStrategy::UsernamePassword)]
#[case::http_with_credentials("http://host/repo.git", credentials(), AuthStrategy::UsernamePassword)]
#[case::http_without_credentials("http://host/repo.git", AuthSettings::default(), AuthStrategy::None)]
#[case::http_with_username_only(
    "http://host/repo.git",
    AuthSettings { username: Some("deploy".into()), ..Default::default() },
    AuthStrategy::None
)]
#[case::git_protocol("git://host/repo.git", credentials(), AuthStrategy::None)]
#[case::scp_with_key("git@host:repo.git", key_file(), AuthStrategy::SshKey)]
#[case::ssh_url_with_key("ssh://git@host/repo.git", key_file(), AuthStrategy::SshKey)]
#[case::scp_without_key("git@host:repo.git", AuthSettings::default(), AuthStrategy::None)]
#[case::scp_with_credentials_only("git@host:repo.git", credentials(), AuthStrategy::None)]
#[case::local_path("/srv/git/repo.git", key_file(), AuthStrategy::None)]
#[case::uppercase_scheme("HTTPS://host/repo.git", credentials(), AuthStrategy::UsernamePassword)]
fn inferred_strategy(#[case] remote: &str, #[case] auth: AuthSettings, #[case] expected: AuthStrategy) {
    let context = AuthenticationResolver::new()
        .resolve(&settings(remote, auth))
        .unwrap();
    assert_eq!(context.strategy(), expected);
}

#[test]
fn username_password_context_carries_decoded_secret() {
    let auth = AuthSettings {
        password: Some("base64:aHVudGVyMg==".into()),
        ..credentials()
    };
    let context = AuthenticationResolver::new()
        .resolve(&settings("https://host/repo.git", auth))
        .unwrap();
    match context {
        AuthenticationContext::UsernamePassword { username, password } => {
            assert_eq!(username, "deploy");
            assert_eq!(password.expose(), "hunter2");
        }
        other => panic!("unexpected context {other}"),
    }
}

#[test]
fn explicit_strategy_overrides_inference() {
    let auth = AuthSettings {
        strategy: Some("none".into()),
        ..credentials()
    };
    let context = AuthenticationResolver::new()
        .resolve(&settings("https://host/repo.git", auth))
        .unwrap();
    assert_eq!(context, AuthenticationContext::None);
}

#[test]
fn explicit_username_password_without_credentials_is_empty() {
    let auth = AuthSettings {
        strategy: Some("UsernamePassword".into()),
        ..Default::default()
    };
    let context = AuthenticationResolver::new()
        .resolve(&settings("https://host/repo.git", auth))
        .unwrap();
    assert_eq!(
        context,
        AuthenticationContext::UsernamePassword {
            username: String::new(),
            password: Secret::default(),
        }
    );
}

#[test]
fn explicit_ssh_without_key_is_configuration_error() {
    let auth = AuthSettings {
        strategy: Some("SSH".into()),
        ..Default::default()
    };
    let err = AuthenticationResolver::new()
        .resolve(&settings("git@host:repo.git", auth))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn unknown_strategy_is_configuration_error() {
    let auth = AuthSettings {
        strategy: Some("kerberos".into()),
        ..Default::default()
    };
    let err = AuthenticationResolver::new()
        .resolve(&settings("git@host:repo.git", auth))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn ssh_context_includes_proxy() {
    let auth = AuthSettings {
        ssh_passphrase: Some("secret".into()),
        proxy: Some(ProxySettings {
            host: "proxy.internal:3128".into(),
            proxy_type: Some("socks4".into()),
            username: None,
            password: None,
        }),
        ..key_file()
    };
    let context = AuthenticationResolver::new()
        .resolve(&settings("git@host:repo.git", auth))
        .unwrap();
    match context {
        AuthenticationContext::SshKey {
            key_file,
            passphrase,
            proxy,
        } => {
            assert_eq!(key_file, std::path::PathBuf::from("/home/app/.ssh/id_ed25519"));
            assert_eq!(passphrase.unwrap().expose(), "secret");
            let proxy = proxy.unwrap();
            assert_eq!(proxy.proxy_type, ProxyType::Socks4);
            assert_eq!(proxy.url().unwrap(), "socks4://proxy.internal:3128");
        }
        other => panic!("unexpected context {other}"),
    }
}

struct Reversed;

impl SecretResolver for Reversed {
    fn resolve(&self, raw: &str) -> vcs_git::Result<Secret> {
        Ok(Secret::new(raw.chars().rev().collect::<String>()))
    }
}

#[test]
fn custom_secret_resolver_is_used() {
    let context = AuthenticationResolver::with_secrets(Reversed)
        .resolve(&settings("https://host/repo.git", credentials()))
        .unwrap();
    match context {
        AuthenticationContext::UsernamePassword { password, .. } => {
            assert_eq!(password.expose(), "2retnuh");
        }
        other => panic!("unexpected context {other}"),
    }
}
