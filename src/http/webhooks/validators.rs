use crate::http::{Error, Result};
use axum::http::HeaderValue;
use ring::{constant_time, hmac};

/// The header GitHub places the body signature in
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Compute the signature GitHub would send for a body
pub fn sign(raw_body: &[u8], secret: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let tag = hmac::sign(&key, raw_body);
    format!("sha256={}", hex::encode(tag.as_ref()))
}

/// Ensure that the provided signature from GitHub is valid
///
/// The signature covers the exact bytes received over the wire, including
/// form-encoded bodies where the event is nested in a field.
pub fn github(raw_body: &[u8], header: Option<&HeaderValue>, secret: &[u8]) -> Result<()> {
    let received = header
        .map(HeaderValue::as_bytes)
        .ok_or(Error::SignatureMismatch)?;
    let expected = sign(raw_body, secret);

    // Does not exit early on the first differing byte
    constant_time::verify_slices_are_equal(expected.as_bytes(), received)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{github, sign};
    use crate::http::Error;
    use axum::http::HeaderValue;
    use std::{
        fs, io,
        sync::{Arc, Mutex},
    };
    use tracing::Level;

    const SECRET: &[u8] = b"the-amazing-test-secret";

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn signature_format() {
        let signature = sign(b"", SECRET);

        assert!(signature.starts_with("sha256="));
        assert_eq!(7 + 64, signature.len());
        assert!(signature[7..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn known_signature() {
        // HMAC-SHA256 test case 2 from RFC 4231
        let signature = sign(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843",
            signature
        );
    }

    #[test]
    fn validate_github_signature() {
        let body = fs::read("testdata/webhooks/github-push.json")
            .expect("failed to read github-push.json test data");
        let signature = header(&sign(&body, SECRET));

        assert!(github(&body, Some(&signature), SECRET).is_ok());
    }

    #[test]
    fn reject_missing_signature() {
        assert!(matches!(
            github(b"{}", None, SECRET),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn reject_wrong_secret() {
        let signature = header(&sign(b"{}", b"some-other-secret"));
        assert!(github(b"{}", Some(&signature), SECRET).is_err());
    }

    #[test]
    fn reject_any_flipped_body_bit() {
        let body = br#"{"ref":"refs/heads/main","repository":{"name":"app"}}"#;
        let signature = header(&sign(body, SECRET));

        for i in 0..body.len() {
            for bit in 0..8 {
                let mut tampered = body.to_vec();
                tampered[i] ^= 1 << bit;
                assert!(github(&tampered, Some(&signature), SECRET).is_err());
            }
        }
    }

    #[test]
    fn reject_mutated_signature() {
        let body = b"payload";
        let signature = sign(body, SECRET);

        // First and last positions are rejected alike
        for position in [0, 7, signature.len() - 1] {
            let mut mutated = signature.clone().into_bytes();
            mutated[position] = if mutated[position] == b'0' { b'1' } else { b'0' };
            let mutated = header(std::str::from_utf8(&mutated).unwrap());

            assert!(github(body, Some(&mutated), SECRET).is_err());
        }
    }

    /// Collects everything written by a subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn expected_signature_is_never_logged() {
        let body = b"payload";
        let expected = sign(body, SECRET);
        let forged = sign(body, b"some-other-secret");

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            github(body, Some(&header(&forged)), SECRET)
        });
        assert!(matches!(result, Err(Error::SignatureMismatch)));

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains(&expected[7..]));
        assert!(!format!("{:?}", result).contains(&expected[7..]));
    }

    #[test]
    fn reject_malformed_signatures() {
        let body = b"payload";
        let signature = sign(body, SECRET);
        let bare = signature.strip_prefix("sha256=").unwrap();
        let uppercase = format!("sha256={}", bare.to_uppercase());
        let truncated = &signature[..signature.len() - 1];

        for value in [bare, uppercase.as_str(), truncated, "sha256=", ""] {
            assert!(github(body, Some(&header(value)), SECRET).is_err());
        }
    }
}
