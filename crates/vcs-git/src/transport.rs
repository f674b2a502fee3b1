//! git2 transport plumbing driven by an [`AuthenticationContext`].

use std::cell::RefCell;
use std::collections::HashSet;

use git2::{
    AutotagOption, Cred, Direction, ErrorClass, ErrorCode, FetchOptions, ProxyOptions, PushOptions,
    Remote, RemoteCallbacks,
};

use crate::auth::AuthenticationContext;
use crate::conflict::{PushOutcome, RefUpdate};
use crate::{Error, Result};

/// libgit2 keeps asking for credentials while the remote refuses them.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Credential callbacks for `auth`.
pub(crate) fn remote_callbacks(auth: &AuthenticationContext) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if matches!(auth, AuthenticationContext::None) {
        return callbacks;
    }

    let mut attempts = 0;
    callbacks.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Callback,
                "credentials rejected by remote",
            ));
        }

        let user = username_from_url.unwrap_or("git");
        match auth {
            AuthenticationContext::UsernamePassword { username, password }
                if allowed.is_user_pass_plaintext() =>
            {
                Cred::userpass_plaintext(username, password.expose())
            }
            AuthenticationContext::SshKey {
                key_file,
                passphrase,
                ..
            } if allowed.is_ssh_key() => Cred::ssh_key(
                user,
                None,
                key_file,
                passphrase.as_ref().map(|p| p.expose()),
            ),
            _ if allowed.is_username() => Cred::username(user),
            _ => Cred::default(),
        }
    });
    callbacks
}

/// Proxy options for `auth`; without an explicit proxy, libgit2 auto-detects.
pub(crate) fn proxy_options(auth: &AuthenticationContext) -> Result<ProxyOptions<'static>> {
    let mut options = ProxyOptions::new();
    match auth {
        AuthenticationContext::SshKey {
            proxy: Some(proxy), ..
        } => {
            options.url(&proxy.url()?);
        }
        _ => {
            options.auto();
        }
    }
    Ok(options)
}

pub(crate) fn fetch_options(auth: &AuthenticationContext) -> Result<FetchOptions<'_>> {
    let mut options = FetchOptions::new();
    options
        .remote_callbacks(remote_callbacks(auth))
        .proxy_options(proxy_options(auth)?)
        .download_tags(AutotagOption::All);
    Ok(options)
}

fn remote_url(remote: &Remote<'_>) -> String {
    remote.url().unwrap_or("<unknown>").to_string()
}

/// Fetch the remote's configured refspecs.
pub(crate) fn fetch(remote: &mut Remote<'_>, auth: &AuthenticationContext) -> Result<()> {
    let url = remote_url(remote);
    let mut options = fetch_options(auth)?;
    tracing::trace!(url = %url, "Fetching");
    remote
        .fetch(&[] as &[&str], Some(&mut options), None)
        .map_err(|e| Error::remote(url, e))
}

/// The branch the remote's `HEAD` points to, e.g. `refs/heads/main`.
pub(crate) fn default_branch(
    remote: &mut Remote<'_>,
    auth: &AuthenticationContext,
) -> Result<Option<String>> {
    let url = remote_url(remote);
    let connection = remote
        .connect_auth(
            Direction::Fetch,
            Some(remote_callbacks(auth)),
            Some(proxy_options(auth)?),
        )
        .map_err(|e| Error::remote(url, e))?;
    Ok(connection
        .default_branch()
        .ok()
        .and_then(|buf| buf.as_str().map(String::from)))
}

/// The revision the remote's `HEAD` advertises, if any.
pub(crate) fn ls_remote_head(url: &str, auth: &AuthenticationContext) -> Result<Option<String>> {
    let mut remote = Remote::create_detached(url).map_err(|e| Error::remote(url, e))?;
    let connection = remote
        .connect_auth(
            Direction::Fetch,
            Some(remote_callbacks(auth)),
            Some(proxy_options(auth)?),
        )
        .map_err(|e| Error::remote(url, e))?;
    let heads = connection.list().map_err(|e| Error::remote(url, e))?;
    Ok(heads
        .iter()
        .find(|head| head.name() == "HEAD")
        .map(|head| head.oid().to_string()))
}

/// Push `refspecs` and report the outcome of every ref update.
///
/// A non-fast-forward refusal is reported as a rejected update rather than an
/// error so the caller can classify it alongside remote-side rejections.
pub(crate) fn push(
    remote: &mut Remote<'_>,
    refspecs: &[String],
    auth: &AuthenticationContext,
) -> Result<Vec<RefUpdate>> {
    let url = remote_url(remote);
    let unchanged: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
    let updates: RefCell<Vec<RefUpdate>> = RefCell::new(Vec::new());

    let result = {
        let mut callbacks = remote_callbacks(auth);
        callbacks.push_negotiation(|proposed| {
            let mut unchanged = unchanged.borrow_mut();
            for update in proposed.iter().filter(|u| u.src() == u.dst()) {
                if let Some(name) = update.dst_refname() {
                    unchanged.insert(name.to_string());
                }
            }
            Ok(())
        });
        callbacks.push_update_reference(|refname, status| {
            let outcome = match status {
                Some(reason) => PushOutcome::Rejected(reason.to_string()),
                None if unchanged.borrow().contains(refname) => PushOutcome::UpToDate,
                None => PushOutcome::Ok,
            };
            updates.borrow_mut().push(RefUpdate::new(refname, outcome));
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);
        options.proxy_options(proxy_options(auth)?);
        tracing::trace!(url = %url, refspecs = ?refspecs, "Pushing");
        remote.push(refspecs, Some(&mut options))
    };

    let mut updates = updates.into_inner();
    match result {
        Ok(()) => Ok(updates),
        Err(e) if e.code() == ErrorCode::NotFastForward => {
            for spec in refspecs {
                updates.push(RefUpdate::new(
                    destination(spec),
                    PushOutcome::Rejected(e.message().to_string()),
                ));
            }
            Ok(updates)
        }
        Err(e) => Err(Error::remote(url, e)),
    }
}

fn destination(refspec: &str) -> &str {
    let spec = refspec.trim_start_matches('+');
    spec.rsplit_once(':').map_or(spec, |(_, dst)| dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ProxyConfig, ProxyType};
    use std::path::PathBuf;

    #[test]
    fn destination_of_refspec() {
        assert_eq!(destination("refs/heads/a:refs/heads/b"), "refs/heads/b");
        assert_eq!(destination("+refs/heads/a:refs/heads/a"), "refs/heads/a");
        assert_eq!(destination("refs/heads/a"), "refs/heads/a");
    }

    #[test]
    fn proxy_options_accept_configured_proxy() {
        let auth = AuthenticationContext::SshKey {
            key_file: PathBuf::from("/keys/id"),
            passphrase: None,
            proxy: Some(ProxyConfig {
                host: "proxy:3128".into(),
                proxy_type: ProxyType::Http,
                username: None,
                password: None,
            }),
        };
        assert!(proxy_options(&auth).is_ok());
        assert!(proxy_options(&AuthenticationContext::None).is_ok());
    }
}
