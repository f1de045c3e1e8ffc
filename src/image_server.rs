//! One-shot HTTP server that hosts a single local image until the frame fetches it.
//!
//! The frame can only display images by URL, so the file is published under an
//! unguessable path, the frame is told to load that URL, and the server is torn
//! down again once the first GET has been answered.

use axum::{
    body::{boxed, Body, BoxBody},
    http::{Method, Request, Response},
    routing::get,
    Router,
};
use hyper::Server;
use rand::RngCore;
use std::net::{IpAddr, SocketAddr, TcpListener, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info, instrument, warn};

use crate::constants::{CONTROL_PORT, IMAGE_NAME_BYTES};
use crate::error::{FrameError, Result};

type DeliveredSignal = Arc<Mutex<Option<oneshot::Sender<()>>>>;

/// Random hex name for `file`, keeping its extension so the frame can tell the format.
///
/// The result is a ready-to-use URL path segment: the extension is percent-encoded,
/// since the router matches the path exactly as it arrives on the wire.
pub fn image_name(file: &Path) -> String {
    let mut bytes = [0u8; IMAGE_NAME_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let extension = file
        .extension()
        .map(|ext| format!(".{}", encode_path_segment(&ext.to_string_lossy())))
        .unwrap_or_default();

    format!("{}{}", hex::encode(bytes), extension)
}

/// Percent-encode everything outside RFC 3986's unreserved set.
fn encode_path_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Address of this host as seen from the frame.
///
/// Connecting a UDP socket sends nothing; it only asks the OS which interface
/// would route to `frame_ip`.
pub fn resolve_local_address(frame_ip: &str) -> Result<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    socket
        .connect((frame_ip, CONTROL_PORT))
        .map_err(|_| FrameError::NoLocalAddress)?;

    let ip = socket.local_addr()?.ip();
    if ip.is_loopback() || ip.is_unspecified() || !ip.is_ipv4() {
        return Err(FrameError::NoLocalAddress);
    }
    Ok(ip)
}

/// Router serving `file` at `route` only. The first successful GET fires `delivered`.
pub fn create_server(route: &str, file: PathBuf, delivered: DeliveredSignal) -> Router {
    let serve_file = ServeFile::new(file);

    Router::new().route(
        route,
        get(move |req: Request<Body>| {
            let serve_file = serve_file.clone();
            let delivered = delivered.clone();
            async move {
                let is_get = req.method() == Method::GET;
                let response: Response<BoxBody> = match serve_file.oneshot(req).await {
                    Ok(response) => response.map(boxed),
                    Err(never) => match never {},
                };

                if is_get && response.status().is_success() {
                    let sender = delivered.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(sender) = sender {
                        debug!("Image fetched by frame");
                        let _ = sender.send(());
                    }
                }
                response
            }
        }),
    )
}

/// A running one-shot image server. Dropping it stops the server.
pub struct ImageServer {
    url: String,
    addr: SocketAddr,
    delivered: oneshot::Receiver<()>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<hyper::Result<()>>>,
}

impl ImageServer {
    /// Bind to `local_ip:port` (port 0 picks a free one) and start serving `file`.
    #[instrument(skip(file))]
    pub async fn start(file: impl AsRef<Path>, local_ip: IpAddr, port: u16) -> Result<Self> {
        let file = file.as_ref();

        // Fail before the frame is involved if the image can't be read
        let metadata = tokio::fs::metadata(file).await?;
        if !metadata.is_file() {
            return Err(FrameError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a file", file.display()),
            )));
        }

        let name = image_name(file);
        let (delivered_tx, delivered_rx) = oneshot::channel();
        let app = create_server(
            &format!("/{name}"),
            file.to_path_buf(),
            Arc::new(Mutex::new(Some(delivered_tx))),
        );

        let listener = TcpListener::bind(SocketAddr::new(local_ip, port))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = Server::from_tcp(listener)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
        let task = tokio::spawn(server);

        let url = format!("http://{addr}/{name}");
        info!(%addr, "Serving image");

        Ok(Self {
            url,
            addr,
            delivered: delivered_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// URL the frame should load.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the image has been served once, or `timeout` passes.
    pub async fn wait_delivered(&mut self, timeout: Option<Duration>) -> Result<()> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, &mut self.delivered)
                .await
                .map_err(|_| {
                    warn!(?limit, "Frame never fetched the image");
                    FrameError::DeliveryTimeout(limit)
                })?,
            None => (&mut self.delivered).await,
        };
        received.map_err(|_| FrameError::ServerStopped)
    }

    /// Stop accepting connections and wait for in-flight responses to finish.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await??;
        }
        debug!(addr = %self.addr, "Image server stopped");
        Ok(())
    }
}

impl Drop for ImageServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::Ipv4Addr;

    fn temp_image(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_image_name_keeps_extension() {
        let name = image_name(Path::new("/photos/sunset.jpg"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), IMAGE_NAME_BYTES * 2 + 4);
        assert!(name[..IMAGE_NAME_BYTES * 2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_image_name_without_extension() {
        let name = image_name(Path::new("/photos/sunset"));
        assert_eq!(name.len(), IMAGE_NAME_BYTES * 2);
    }

    #[test]
    fn test_image_names_are_unique() {
        let path = Path::new("a.png");
        assert_ne!(image_name(path), image_name(path));
    }

    #[tokio::test]
    async fn test_serves_image_once_and_stops() {
        let image = temp_image(".png", b"not really a png");
        let mut server = ImageServer::start(image.path(), IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .unwrap();
        assert!(server.url().ends_with(".png"));

        let response = reqwest::get(server.url()).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"not really a png");

        server.wait_delivered(Some(Duration::from_secs(5))).await.unwrap();
        let addr = server.local_addr();
        server.stop().await.unwrap();

        assert!(reqwest::get(format!("http://{addr}/")).await.is_err());
    }

    #[test]
    fn test_image_name_encodes_unusual_extensions() {
        assert!(image_name(Path::new("a.j pg")).ends_with(".j%20pg"));
        assert!(image_name(Path::new("a.jp\u{e9}")).ends_with(".jp%C3%A9"));
        assert_eq!(encode_path_segment("Png-1_~"), "Png-1_~");
    }

    #[tokio::test]
    async fn test_serves_image_with_unusual_extension() {
        for suffix in [".j pg", ".jp\u{e9}"] {
            let image = temp_image(suffix, b"pixels");
            let mut server = ImageServer::start(image.path(), IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
                .await
                .unwrap();

            let response = reqwest::get(server.url()).await.unwrap();
            assert!(response.status().is_success(), "{suffix:?} -> {}", response.status());
            assert_eq!(response.bytes().await.unwrap().as_ref(), b"pixels");

            server.wait_delivered(Some(Duration::from_secs(5))).await.unwrap();
            server.stop().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_wait_without_timeout_sees_delivery() {
        let image = temp_image(".gif", b"gif");
        let mut server = ImageServer::start(image.path(), IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .unwrap();

        let url = server.url().to_string();
        let fetch = tokio::spawn(async move { reqwest::get(url).await.unwrap().bytes().await });

        server.wait_delivered(None).await.unwrap();
        assert_eq!(fetch.await.unwrap().unwrap().as_ref(), b"gif");
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_other_paths_are_not_found() {
        let image = temp_image(".jpg", b"jpeg");
        let mut server = ImageServer::start(image.path(), IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .unwrap();

        let addr = server.local_addr();
        let response = reqwest::get(format!("http://{addr}/guess.jpg")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        let err = server
            .wait_delivered(Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::DeliveryTimeout(_)));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let result = ImageServer::start(
            "/nonexistent/picture.jpg",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
        )
        .await;
        assert!(matches!(result, Err(FrameError::Io(_))));
    }
}
