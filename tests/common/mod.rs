#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    /// Path as sent on the wire, still percent-encoded.
    pub path: String,
    pub body: String,
}

pub type Seen = Arc<Mutex<Vec<Request>>>;

type Handler = Arc<dyn Fn(&Request) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct Stub {
    seen: Seen,
    handler: Handler,
}

/// HTTP server answering every request through `handler` and recording it.
pub async fn spawn_stub<F>(handler: F) -> (String, Seen)
where
    F: Fn(&Request) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new().fallback(record).with_state(Stub {
        seen: seen.clone(),
        handler: Arc::new(handler),
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });

    (format!("http://{}", addr), seen)
}

async fn record(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, String) {
    let request = Request {
        method: method.to_string(),
        path: uri.path().to_owned(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let (status, reply) = (stub.handler)(&request);
    stub.seen.lock().unwrap().push(request);
    (StatusCode::from_u16(status).unwrap(), reply)
}

/// Server that accepts connections and never answers.
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            open.push(stream);
        }
    });
    format!("http://{}", addr)
}

/// URL of a port nobody listens on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
