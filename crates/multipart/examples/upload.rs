//! Builds a multipart body and drains it the way an HTTP client would.
//!
//! ```text
//! cargo run -p micro-multipart --example upload -- path/to/file
//! ```

use http::Request;
use http_body_util::BodyExt;
use micro_multipart::Multipart;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let path = std::env::args().nth(1).unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml").to_string());

    let mut multipart = Multipart::new();
    multipart.add_field("description", "uploaded by the example").expect("add field");
    if let Err(e) = multipart.add_file("file", &path) {
        error!(cause = %e, "failed to add file");
        return;
    }

    let request = match multipart.into_request(Request::post("http://localhost:8080/upload")) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "failed to build request");
            return;
        }
    };
    info!(headers = ?request.headers(), "request ready");

    let mut body = request.into_body();
    let mut frames = 0;
    let mut size = 0;
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(data) = frame.data_ref() {
                    frames += 1;
                    size += data.len();
                }
            }
            Err(e) => {
                error!(cause = %e, "failed to stream body");
                return;
            }
        }
    }

    info!(frames, size, open_resources = body.open_resources(), "body streamed");
}
