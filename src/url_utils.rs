//! URL helpers for deriving store keys from crawl targets.

use url::Url;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a. Stable across builds, so fingerprints survive restarts.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_extend(FNV_OFFSET, bytes)
}

fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Fingerprint of a request: FNV-1a over the URL followed by the body, if any.
pub fn request_fingerprint(url: &str, body: Option<&[u8]>) -> u64 {
    let hash = fnv1a64(url.as_bytes());
    match body {
        Some(body) => fnv1a64_extend(hash, body),
        None => hash,
    }
}

/// Authority used as the cookie key: host plus an explicit port, if the URL has one.
pub fn cookie_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| cookie_host(&u))
}
