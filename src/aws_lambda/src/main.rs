use std::sync::Arc;

use lambda_http::http::{Method, StatusCode};
use lambda_http::{run, service_fn, Body, Error, Request, Response};

use log::debug;

use court_serve::{image_from_body, DetectError, RekognitionClient, SurfaceDetector, Timer};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let source = RekognitionClient::from_env()?;
    let detector = Arc::new(SurfaceDetector::new(source));

    debug!("Provider client ready");

    run(service_fn(move |event: Request| {
        let detector = Arc::clone(&detector);
        async move { handle_request(event, detector).await }
    }))
    .await
}

async fn handle_request(
    event: Request,
    detector: Arc<SurfaceDetector<RekognitionClient>>,
) -> Result<Response<Body>, Error> {
    debug!("Received request: {:#?}", event);

    // CORS preflight from the browser frontend
    if event.method() == Method::OPTIONS {
        return respond(StatusCode::OK, String::new());
    }

    let mut t = Timer::new_start("Handling request");

    let body = event.body().to_vec();
    let result = tokio::task::spawn_blocking(move || {
        let image = image_from_body(&body)?;
        detector.detect_from_raw(&image)
    })
    .await?;

    let response = match result {
        Ok(classification) => respond(StatusCode::OK, serde_json::to_string(&classification)?),
        Err(err) => error_response(&err),
    };

    t.stop();

    response
}

fn respond(status: StatusCode, body: String) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type,Authorization")
        .header("Access-Control-Allow-Methods", "POST,OPTIONS")
        .body(Body::from(body))?)
}

fn error_response(err: &DetectError) -> Result<Response<Body>, Error> {
    let payload = serde_json::json!({ "erro": err.to_string() });
    respond(StatusCode::from_u16(err.status_code())?, payload.to_string())
}
