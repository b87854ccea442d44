//! Negotiated session parameters
//!
//! Read-only view of what the backend negotiated for one connection,
//! available once a handshake has completed.

use crate::cert::CertInfo;
use openssl::ssl::SslRef;

/// Parameters negotiated during the handshake
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Negotiated protocol version (e.g., "TLSv1.3")
    pub version: String,

    /// Negotiated cipher suite
    pub cipher: Option<String>,

    /// Peer certificate, if the peer presented one
    pub peer_cert: Option<CertInfo>,
}

impl SessionInfo {
    pub(crate) fn from_ssl(ssl: &SslRef) -> Self {
        SessionInfo {
            version: ssl.version_str().to_string(),
            cipher: ssl.current_cipher().map(|c| c.name().to_string()),
            peer_cert: ssl
                .peer_certificate()
                .map(|cert| CertInfo::from_x509(&cert)),
        }
    }
}
