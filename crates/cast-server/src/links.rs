//! Signed pairing links
//!
//! A pairing link is `{origin}/pair-room/{id}?sig={hex}`, where `sig` is
//! HMAC-SHA256 over the decimal room id. A valid signature shows the link
//! was issued under this server's secret (or by this process, when the
//! secret is random); it does not hide links, since `/qr-code` and
//! `/api/rooms` hand them to any caller.

use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

use cast_core::RoomId;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated signing key in bytes
const KEY_BYTES: usize = 32;

/// Path prefix of the pairing endpoint
pub const PAIR_PATH: &str = "/pair-room";

/// Signs and verifies room ids
#[derive(Clone)]
pub struct LinkSigner {
    key: Vec<u8>,
}

impl LinkSigner {
    /// Create a signer with a fixed secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    /// Create a signer with a random secret; its links die with the process
    pub fn random() -> Self {
        use rand::Rng;
        let mut key = [0u8; KEY_BYTES];
        rand::thread_rng().fill(&mut key);
        Self { key: key.to_vec() }
    }

    fn mac(&self, room_id: RoomId) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC takes any key length");
        mac.update(room_id.to_string().as_bytes());
        mac
    }

    /// Hex signature for a room
    pub fn sign(&self, room_id: RoomId) -> String {
        hex::encode(self.mac(room_id).finalize().into_bytes())
    }

    /// Check a hex signature in constant time
    pub fn verify(&self, room_id: RoomId, signature: &str) -> bool {
        match hex::decode(signature.trim()) {
            Ok(bytes) => self.mac(room_id).verify_slice(&bytes).is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner").finish_non_exhaustive()
    }
}

/// Builds pairing URLs under the externally reachable origin
#[derive(Debug, Clone)]
pub struct PairingLinks {
    signer: LinkSigner,
    public_origin: Option<Url>,
}

impl PairingLinks {
    /// `public_origin` wins over any origin derived from a request
    pub fn new(signer: LinkSigner, public_origin: Option<Url>) -> Self {
        Self {
            signer,
            public_origin,
        }
    }

    pub fn signer(&self) -> &LinkSigner {
        &self.signer
    }

    /// Configured origin, if any
    pub fn public_origin(&self) -> Option<&Url> {
        self.public_origin.as_ref()
    }

    /// Pairing URL for a room
    ///
    /// `request_origin` is used only when no public origin is configured.
    /// Returns `None` when neither is available.
    pub fn url_for(&self, room_id: RoomId, request_origin: Option<&Url>) -> Option<Url> {
        let origin = self.public_origin.as_ref().or(request_origin)?;

        let mut url = origin.clone();
        let base = origin.path().trim_end_matches('/');
        url.set_path(&format!("{}{}/{}", base, PAIR_PATH, room_id));
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair("sig", &self.signer.sign(room_id));
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(origin: Option<&str>) -> PairingLinks {
        PairingLinks::new(
            LinkSigner::new("test-secret"),
            origin.map(|o| Url::parse(o).unwrap()),
        )
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = LinkSigner::new("test-secret");
        let sig = signer.sign(RoomId(7));

        assert_eq!(sig.len(), 64);
        assert!(signer.verify(RoomId(7), &sig));
        assert!(signer.verify(RoomId(7), &sig.to_uppercase()));
        assert!(!signer.verify(RoomId(8), &sig));
        assert!(!signer.verify(RoomId(7), "zz"));
        assert!(!signer.verify(RoomId(7), ""));
    }

    #[test]
    fn test_signatures_depend_on_secret() {
        let a = LinkSigner::new("a");
        let b = LinkSigner::new("b");
        assert!(!b.verify(RoomId(1), &a.sign(RoomId(1))));

        let random = LinkSigner::random();
        assert!(random.verify(RoomId(1), &random.sign(RoomId(1))));
    }

    #[test]
    fn test_signature_binds_secret_not_instance() {
        let issued = LinkSigner::new("shared").sign(RoomId(4));
        assert!(LinkSigner::new("shared").verify(RoomId(4), &issued));

        let first = LinkSigner::random();
        let second = LinkSigner::random();
        assert!(!second.verify(RoomId(4), &first.sign(RoomId(4))));
    }

    #[test]
    fn test_url_omits_default_port() {
        let request = Url::parse("http://cast.local:80/").unwrap();
        let url = links(None).url_for(RoomId(3), Some(&request)).unwrap();
        assert!(url.as_str().starts_with("http://cast.local/pair-room/3?sig="));

        let request = Url::parse("https://cast.local:443").unwrap();
        let url = links(None).url_for(RoomId(3), Some(&request)).unwrap();
        assert!(url.as_str().starts_with("https://cast.local/pair-room/3?sig="));
    }

    #[test]
    fn test_url_keeps_explicit_port() {
        let request = Url::parse("http://192.168.1.10:8080").unwrap();
        let url = links(None).url_for(RoomId(12), Some(&request)).unwrap();
        assert!(url.as_str().starts_with("http://192.168.1.10:8080/pair-room/12?sig="));
    }

    #[test]
    fn test_public_origin_wins() {
        let request = Url::parse("http://10.0.0.5:8080").unwrap();
        let url = links(Some("https://cast.example.org/castpair/"))
            .url_for(RoomId(1), Some(&request))
            .unwrap();
        assert!(url
            .as_str()
            .starts_with("https://cast.example.org/castpair/pair-room/1?sig="));
    }

    #[test]
    fn test_no_origin_no_url() {
        assert!(links(None).url_for(RoomId(1), None).is_none());
    }

    #[test]
    fn test_url_signature_verifies() {
        let links = links(Some("http://cast.local"));
        let url = links.url_for(RoomId(5), None).unwrap();
        let sig = url
            .query_pairs()
            .find(|(k, _)| k == "sig")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(links.signer().verify(RoomId(5), &sig));
    }
}
