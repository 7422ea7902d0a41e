use std::convert::Infallible;
use std::sync::Arc;

use tracing::warn;
use warp::http::StatusCode;
use warp::Filter;
use xsp_messages::types::request::ProofRequest;

use crate::manager::ProofManager;

/// Proof requests are small; anything bigger is not one.
const MAX_REQUEST_BYTES: u64 = 16 * 1024;

pub(crate) fn routes(
    manager: Arc<ProofManager>
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let readiness_route = warp::path!("readiness")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let proof_route = warp::path!("v1" / "proof")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_REQUEST_BYTES))
        .and(warp::body::json())
        .and(warp::any().map(move || manager.clone()))
        .and_then(handle_proof);

    readiness_route.or(proof_route)
}

async fn handle_proof(
    request: ProofRequest,
    manager: Arc<ProofManager>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let reply = match manager.handle(request).await {
        Ok(reply) => warp::reply::with_status(warp::reply::json(&reply), StatusCode::OK),
        Err(err) => {
            warn!("rejected proof request: {err:#}");
            let body = serde_json::json!({ "error": format!("{err:#}") });
            warp::reply::with_status(warp::reply::json(&body), StatusCode::BAD_REQUEST)
        },
    };
    Ok(reply)
}
