//! Trust root loading
//!
//! The platform pipeline trusts the operating system store, falling back to
//! the bundled Mozilla roots when the store cannot be read cleanly. The
//! upgrade path always uses the bundled roots so its behavior does not vary
//! with the host environment.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustls::RootCertStore;

use crate::config::ConfigurationError;

/// Bundled webpki roots.
#[must_use]
pub fn bundled_roots() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    root_store
}

/// Operating system roots, with the bundled roots added on load errors.
#[must_use]
pub fn platform_roots() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    let cert_result = rustls_native_certs::load_native_certs();

    for cert in cert_result.certs {
        if let Err(e) = root_store.add(cert) {
            tracing::warn!("Failed to add system certificate: {}", e);
        }
    }

    if !cert_result.errors.is_empty() || root_store.is_empty() {
        for err in &cert_result.errors {
            tracing::warn!("Certificate load error: {}", err);
        }
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    tracing::debug!("Loaded {} platform root certificates", root_store.len());
    root_store
}

/// Add every certificate in the PEM files at `paths` to `root_store`.
///
/// # Errors
///
/// Returns `ConfigurationError::RootCertificates` if a file cannot be read,
/// contains no certificates, or a certificate is rejected by the store.
pub fn add_pem_roots<P: AsRef<Path>>(
    root_store: &mut RootCertStore,
    paths: &[P],
) -> Result<usize, ConfigurationError> {
    let mut added = 0;

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ConfigurationError::RootCertificates(format!("{}: {e}", path.display()))
        })?;

        let mut found = 0;
        for cert in rustls_pemfile::certs(&mut BufReader::new(file)) {
            let cert = cert.map_err(|e| {
                ConfigurationError::RootCertificates(format!("{}: {e}", path.display()))
            })?;
            root_store.add(cert).map_err(|e| {
                ConfigurationError::RootCertificates(format!("{}: {e}", path.display()))
            })?;
            found += 1;
        }

        if found == 0 {
            return Err(ConfigurationError::RootCertificates(format!(
                "{} contains no certificates",
                path.display()
            )));
        }

        tracing::debug!("Added {} root certificates from {}", found, path.display());
        added += found;
    }

    Ok(added)
}
