use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::llm::Completion;
use crate::tts::{SpeechSynthesis, VoiceParams};

#[derive(Debug, Default, Deserialize)]
struct TextRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(flatten)]
    voice: VoiceParams,
}

/// Accept connections until Ctrl-C
pub async fn serve<C, S>(gateway: Arc<Gateway<C, S>>, addr: SocketAddr) -> anyhow::Result<()>
where
    C: Completion + 'static,
    S: SpeechSynthesis + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Health check: http://{}/api/health", addr);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                return Ok(());
            }
        };

        let gateway = gateway.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| handle(gateway.clone(), req));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!("Connection from {} closed with error: {}", peer, e);
            }
        });
    }
}

async fn handle<C, S>(
    gateway: Arc<Gateway<C, S>>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    C: Completion,
    S: SpeechSynthesis,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "failed to read request body" }),
            ));
        }
    };

    Ok(route(&gateway, &parts.method, parts.uri.path(), &body).await)
}

/// Dispatch one request to its gateway operation
pub async fn route<C, S>(
    gateway: &Gateway<C, S>,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Response<Full<Bytes>>
where
    C: Completion,
    S: SpeechSynthesis,
{
    tracing::debug!("{} {}", method, path);

    if *method == Method::OPTIONS {
        return preflight();
    }

    match (method, path) {
        (&Method::GET, "/api/health") => json_response(
            StatusCode::OK,
            &json!({ "ok": true, "status": "Server is running" }),
        ),
        (&Method::POST, "/api/furigana") => {
            let req: TextRequest = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            let text = req.text.unwrap_or_default();
            match gateway.annotate(&text).await {
                Ok(segments) => json_response(StatusCode::OK, &segments),
                Err(e) => error_response("Failed to process text", e),
            }
        }
        (&Method::POST, "/api/analyze") => {
            let req: TextRequest = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            let text = req.text.unwrap_or_default();
            match gateway.analyze(&text).await {
                Ok(analysis) => json_response(StatusCode::OK, &analysis),
                Err(e) => error_response("Failed to analyze sentence", e),
            }
        }
        (&Method::POST, "/api/translate") => {
            let req: TextRequest = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            let text = req.text.unwrap_or_default();
            match gateway.translate(&text).await {
                Ok(japanese) => json_response(StatusCode::OK, &json!({ "japanese": japanese })),
                Err(e) => error_response("Failed to translate text", e),
            }
        }
        (&Method::POST, "/api/translate-kr-to-jp") => {
            let req: TextRequest = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            let text = req.text.unwrap_or_default();
            match gateway.translate_and_annotate(&text).await {
                Ok(result) => json_response(StatusCode::OK, &result),
                Err(e) => error_response("Failed to translate and analyze text", e),
            }
        }
        (&Method::POST, "/api/tts") => {
            let req: SpeechRequest = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            let text = req.text.unwrap_or_default();
            match gateway.synthesize_speech(&text, &req.voice).await {
                Ok(audio) => audio_response(audio),
                Err(e) => error_response("TTS generation failed", e),
            }
        }
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "not found" })),
    }
}

/// Empty bodies read as `{}`
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, Response<Full<Bytes>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting malformed JSON body: {}", e);
        json_response(StatusCode::BAD_REQUEST, &json!({ "error": "invalid JSON body" }))
    })
}

fn error_response(context: &str, err: GatewayError) -> Response<Full<Bytes>> {
    let status = err.status();
    if status == StatusCode::BAD_REQUEST {
        return json_response(status, &json!({ "error": err.to_string() }));
    }

    tracing::error!("{}: {}", context, err);
    json_response(
        status,
        &json!({ "error": context, "details": err.to_string() }),
    )
}

fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let (status, body) = match serde_json::to_vec(value) {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"failed to serialize response"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

fn audio_response(audio: Bytes) -> Response<Full<Bytes>> {
    let length = HeaderValue::from(audio.len());
    let mut response = Response::new(Full::new(audio));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(CONTENT_LENGTH, length);
    with_cors(response)
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,PUT,PATCH,POST,DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    with_cors(response)
}
