use axum::http::Request;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::{info_span, Level, Span};
use uuid::Uuid;

/// The header GitHub uses to identify a single delivery
const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Tags each request span with the GitHub delivery it carries, so redeliveries
/// from the hook settings page can be matched against the logs
#[derive(Clone, Copy)]
pub struct MakeDeliverySpan;

impl<B> MakeSpan<B> for MakeDeliverySpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            delivery = %delivery_id(request),
        )
    }
}

/// The delivery id of a request, or a fresh id for requests without one
fn delivery_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(DELIVERY_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}

/// Create a logging middleware layer
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeDeliverySpan> {
    TraceLayer::new_for_http()
        .make_span_with(MakeDeliverySpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
