use geoprobe::error::SourceError;
use geoprobe::sources::{AddressSource, HttpAddressSource};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response and return the endpoint URL
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{}/", addr)
}

#[tokio::test]
async fn test_returns_trimmed_address() {
    let endpoint = serve_once("200 OK", "203.0.113.42\n").await;
    let source = HttpAddressSource::new(endpoint, Duration::from_secs(5));

    assert_eq!(source.public_address().await.unwrap(), "203.0.113.42");
}

#[tokio::test]
async fn test_empty_body_fails() {
    let endpoint = serve_once("200 OK", "").await;
    let source = HttpAddressSource::new(endpoint, Duration::from_secs(5));

    let err = source.public_address().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SourceError>(),
        Some(SourceError::EmptyResponse(_))
    ));
}

#[tokio::test]
async fn test_server_error_fails() {
    let endpoint = serve_once("503 Service Unavailable", "busy").await;
    let source = HttpAddressSource::new(endpoint, Duration::from_secs(5));

    let err = source.public_address().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SourceError>(),
        Some(SourceError::Http { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_fails() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpAddressSource::new(format!("http://{}/", addr), Duration::from_secs(2));

    assert!(source.public_address().await.is_err());
}
