//! TLS provider setup shared by the WebSocket and HTTP clients.

use once_cell::sync::Lazy;
use tracing::debug;

static CRYPTO_PROVIDER: Lazy<()> = Lazy::new(|| {
    // Another component of the process may have installed one already.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
});

/// Install the ring crypto provider for rustls, at most once per process.
///
/// Must run before the first `wss://` dial.
pub fn ensure_crypto_provider() {
    Lazy::force(&CRYPTO_PROVIDER);
}
