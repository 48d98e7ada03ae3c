//! Request forwarding
//!
//! Every inbound request goes through [`dispatch`]: match a route, rewrite
//! the path, forward once, relay the answer. Unmatched requests get the
//! default responder and never reach a backend.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::error::GatewayError;

use super::routes::Route;
use super::GatewayState;

/// Body of the default responder
pub const DEFAULT_RESPONSE_BODY: &str = "Gateway running";

/// Connection-scoped headers that are never forwarded in either direction
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Gateway fallback handler
pub async fn dispatch(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let route = match state.routes.resolve(request.uri().path()) {
        Some(route) => route.clone(),
        None => {
            debug!(path = %request.uri().path(), "No route matched");
            return Ok(default_response());
        }
    };

    forward(&state, &route, request).await
}

/// Default responder for unmatched paths
pub fn default_response() -> Response {
    (StatusCode::OK, DEFAULT_RESPONSE_BODY).into_response()
}

async fn forward(
    state: &GatewayState,
    route: &Route,
    request: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = route.upstream_url(path_and_query);

    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| {
            warn!(prefix = route.prefix(), error = %e, "Failed to read request body");
            GatewayError::RequestConstruction(e.to_string())
        })?;

    let outbound = state
        .client
        .request(parts.method.clone(), url.as_str())
        .headers(forwardable_headers(&parts.headers, true))
        .body(body)
        .build()
        .map_err(|e| {
            warn!(prefix = route.prefix(), upstream = route.upstream(), error = %e, "Failed to build upstream request");
            GatewayError::RequestConstruction(e.to_string())
        })?;

    let upstream = state.client.execute(outbound).await.map_err(|e| {
        warn!(prefix = route.prefix(), upstream = route.upstream(), error = %e, "Upstream request failed");
        GatewayError::UpstreamUnavailable(e.to_string())
    })?;

    let status = upstream.status();
    info!(
        method = %parts.method,
        prefix = route.prefix(),
        upstream = route.upstream(),
        status = status.as_u16(),
        "Request forwarded"
    );

    let headers = forwardable_headers(upstream.headers(), false);
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(response)
}

/// Copy `headers`, dropping hop-by-hop headers
///
/// Headers named in `Connection` are dropped too. For outbound requests the
/// `Host` and `Content-Length` headers are dropped so the client sets them
/// for the backend.
fn forwardable_headers(headers: &HeaderMap, outbound: bool) -> HeaderMap {
    let connection_scoped: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || connection_scoped.iter().any(|n| n == name.as_str()) {
            continue;
        }
        if outbound && (name == header::HOST || name == header::CONTENT_LENGTH) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::RequestConstruction(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            GatewayError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "Bad gateway"),
        };

        let body = serde_json::json!({
            "error": message
        });
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
