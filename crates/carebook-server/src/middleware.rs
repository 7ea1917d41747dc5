use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use carebook_api::ApiError;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id middleware: keeps an incoming `x-request-id` or generates a
/// UUID, exposes it to the trace span via request extensions and echoes it
/// on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    let req_id_value = match req.headers().get(&header_name) {
        Some(existing) => existing.clone(),
        None => match HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            Ok(generated) => generated,
            Err(_) => return next.run(req).await,
        },
    };

    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

// Content negotiation middleware: responses are JSON only (406 otherwise),
// and POST/PUT bodies must be declared as JSON (415 otherwise).
pub async fn content_negotiation(req: Request<Body>, next: Next) -> Response {
    let accept_ok = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.to_ascii_lowercase();
            v.contains("application/json") || v.contains("*/*")
        })
        .unwrap_or(true); // if missing, treat as ok per HTTP defaults

    if !accept_ok {
        return ApiError::not_acceptable("Only application/json responses are available")
            .into_response();
    }

    let needs_body_type = req.method() == Method::POST || req.method() == Method::PUT;
    if needs_body_type {
        let content_ok = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);
        if !content_ok {
            return ApiError::unsupported_media_type("Content-Type must be application/json")
                .into_response();
        }
    }

    next.run(req).await
}
