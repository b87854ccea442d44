//! Peer certificate information
//!
//! Extracts the identification fields of an X.509 certificate from the
//! backend's certificate objects, for inspection after a handshake.

use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Identification fields of one X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Subject Common Name
    pub subject: String,
    /// Issuer Common Name
    pub issuer: String,
    /// Subject Alternative Names (DNS names and IP addresses)
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    /// Extract certificate information from a backend certificate object
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: common_name(cert.subject_name()),
            issuer: common_name(cert.issuer_name()),
            subject_alt_names: subject_alt_names(cert),
        }
    }
}

fn common_name(name: &X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "<undef>".to_string())
}

fn subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let mut names = Vec::new();

    let Some(sans) = cert.subject_alt_names() else {
        return names;
    };

    for san in sans {
        if let Some(dns) = san.dnsname() {
            names.push(format!("DNS:{}", dns));
        } else if let Some(ip) = san.ipaddress() {
            if let Ok(octets) = <[u8; 4]>::try_from(ip) {
                names.push(format!("IP:{}", Ipv4Addr::from(octets)));
            } else if let Ok(octets) = <[u8; 16]>::try_from(ip) {
                names.push(format!("IP:{}", Ipv6Addr::from(octets)));
            }
        }
    }

    names
}
