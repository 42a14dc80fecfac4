//! Certificate policy against a control plane serving a self-signed certificate.

use std::net::SocketAddr;
use std::sync::Arc;

use diver_core::{ApiError, ClientConfig, UcpClient};
use reqwest::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::crypto::ring::default_provider;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

const PING_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";

/// HTTPS server on 127.0.0.1 answering every request with `200 OK`.
/// Connections whose handshake fails are dropped.
async fn start_self_signed_server() -> SocketAddr {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match tls.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = tls.write_all(PING_RESPONSE).await;
                let _ = tls.shutdown().await;
            });
        }
    });

    addr
}

fn client_for(addr: SocketAddr, ignore_cert: bool) -> UcpClient {
    let config = ClientConfig::new("admin", "orca-pass", format!("https://{}", addr), ignore_cert);
    UcpClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_untrusted_certificate_is_transport_error() {
    let addr = start_self_signed_server().await;
    let client = client_for(addr, false);

    let result = client.do_request(Method::GET, "/_ping", None, false).await;
    assert!(matches!(result, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn test_ignore_cert_reaches_http_layer() {
    let addr = start_self_signed_server().await;
    let client = client_for(addr, true);

    let body = client
        .do_request(Method::GET, "/_ping", None, false)
        .await
        .unwrap();
    assert_eq!(body, b"OK");
}
