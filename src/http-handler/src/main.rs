use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{body, Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};

use court_serve::{image_from_body, DetectError, RekognitionClient, SurfaceDetector, Timer};

async fn handle(
    req: Request<Body>,
    detector: Arc<SurfaceDetector<RekognitionClient>>,
) -> Result<Response<Body>, Infallible> {
    if req.method() == Method::OPTIONS {
        return Ok(respond(StatusCode::OK, String::new()));
    }

    let raw = match body::to_bytes(req.into_body()).await {
        Ok(raw) => raw,
        Err(err) => {
            let payload = serde_json::json!({ "erro": format!("falha ao ler o corpo: {}", err) });
            return Ok(respond(StatusCode::BAD_REQUEST, payload.to_string()));
        }
    };

    let mut t = Timer::new_start("Handling request");

    // Detection blocks on the provider call, keep it off the executor.
    let result = tokio::task::spawn_blocking(move || {
        let image = image_from_body(&raw)?;
        detector.detect_from_raw(&image)
    })
    .await;

    let response = match result {
        Ok(Ok(classification)) => {
            let body = serde_json::to_string(&classification).expect("Failed to render response");
            respond(StatusCode::OK, body)
        }
        Ok(Err(err)) => error_response(&err),
        Err(err) => {
            error!("detection task panicked: {}", err);
            let payload = serde_json::json!({ "erro": "erro interno" });
            respond(StatusCode::INTERNAL_SERVER_ERROR, payload.to_string())
        }
    };

    t.stop();

    Ok(response)
}

fn respond(status: StatusCode, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type,Authorization")
        .header("Access-Control-Allow-Methods", "POST,OPTIONS")
        .body(Body::from(body))
        .expect("Failed to render response")
}

fn error_response(err: &DetectError) -> Response<Body> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let payload = serde_json::json!({ "erro": err.to_string() });
    respond(status, payload.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let source = RekognitionClient::from_env().expect("provider configuration");
    let detector = Arc::new(SurfaceDetector::new(source));

    // One service per connection, all sharing the detector.
    let make_service = make_service_fn(move |_conn: &AddrStream| {
        let detector = Arc::clone(&detector);

        let service = service_fn(move |req| handle(req, detector.clone()));

        async move { Ok::<_, Infallible>(service) }
    });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on {}", addr);

    let server = Server::bind(&addr).serve(make_service);

    if let Err(e) = server.await {
        eprintln!("server error: {}", e);
    }
}
