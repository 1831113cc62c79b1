use crate::http::{Error, Result};
use axum::http::HeaderValue;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use url::form_urlencoded;

/// The form field GitHub places the event in
const FORM_FIELD: &str = "payload";

/// The ways GitHub can deliver an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// The body is the event
    Json,
    /// The event is in the `payload` field of a form
    Form,
}

impl Encoding {
    /// Determine the encoding from the content type. Parameters such as the
    /// charset are ignored.
    pub fn from_content_type(header: Option<&HeaderValue>) -> Result<Encoding> {
        let raw = header
            .and_then(|h| h.to_str().ok())
            .ok_or(Error::UnsupportedMediaType)?;
        let essence = raw.split(';').next().unwrap_or_default().trim();

        if essence.eq_ignore_ascii_case("application/json") {
            Ok(Encoding::Json)
        } else if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Ok(Encoding::Form)
        } else {
            Err(Error::UnsupportedMediaType)
        }
    }

    /// Extract the raw event from the body
    pub fn event<'b>(&self, raw_body: &'b [u8]) -> Result<Cow<'b, [u8]>> {
        match self {
            Encoding::Json => Ok(Cow::Borrowed(raw_body)),
            Encoding::Form => form_urlencoded::parse(raw_body)
                .find(|(key, _)| key == FORM_FIELD)
                .map(|(_, value)| Cow::Owned(value.into_owned().into_bytes()))
                .ok_or(Error::InvalidPayload),
        }
    }
}

/// Get the raw event from a body of the given content type
pub fn decode<'b>(raw_body: &'b [u8], content_type: Option<&HeaderValue>) -> Result<Cow<'b, [u8]>> {
    Encoding::from_content_type(content_type)?.event(raw_body)
}

/// Parse a raw event into its structured form
pub fn parse<T: DeserializeOwned>(event: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(event)?)
}
