//! End-to-end tests: a real server on an ephemeral port, raw HTTP over TCP.

use cors_server::{Config, CorsServer, ServerError};
use std::net::SocketAddr;
use std::path::Path;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, OPTIONS"),
    ("cache-control", "no-store, no-cache, must-revalidate"),
];

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn header_count(&self, name: &str) -> usize {
        self.headers.iter().filter(|(n, _)| n == name).count()
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn assert_cors_headers(&self) {
        for (name, value) in CORS_HEADERS {
            assert_eq!(self.header_count(name), 1, "{name} on {}", self.status);
            assert_eq!(self.header(name), Some(value));
        }
        // Injected after every header the base handling produced
        let names: Vec<_> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        let origin = names
            .iter()
            .position(|n| *n == "access-control-allow-origin")
            .unwrap();
        assert_eq!(
            &names[origin..origin + 3],
            &[
                "access-control-allow-origin",
                "access-control-allow-methods",
                "cache-control"
            ]
        );
    }
}

fn config_for(root: &Path) -> Config {
    let mut cfg = Config::defaults().unwrap();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.root = root.to_path_buf();
    cfg.logging.access_log = false;
    cfg
}

async fn start(root: &Path) -> SocketAddr {
    let server = CorsServer::bind(config_for(root)).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve_forever());
    addr
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hi").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1);").unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("guide.md"), "# Guide").unwrap();
    dir
}

async fn send(addr: SocketAddr, method: &str, target: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
    let mut request = format!("{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&raw)
}

async fn get(addr: SocketAddr, target: &str) -> RawResponse {
    send(addr, "GET", target, &[]).await
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("incomplete response head");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();

    let headers = lines
        .map(|line| {
            let (name, value) = line.split_once(':').unwrap();
            (name.trim().to_ascii_lowercase(), value.trim().to_string())
        })
        .collect();

    RawResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

#[tokio::test]
async fn test_hello_scenario() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/hello.txt").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hi");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("content-length"), Some("2"));
    assert!(response.header("last-modified").is_some());
    assert!(response.header("date").is_some());
    assert!(response.header("server").unwrap().starts_with("cors-server/"));
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_file_body_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    std::fs::write(dir.path().join("blob.bin"), &payload).unwrap();
    let addr = start(dir.path()).await;

    let response = get(addr, "/blob.bin").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/octet-stream"));
    assert_eq!(response.body, payload);
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_missing_path_is_404() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/nope.txt").await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("connection"), Some("close"));
    assert!(response.body_text().contains("File not found"));
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_root_serves_index_html() {
    let dir = fixture();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    let addr = start(dir.path()).await;

    let response = get(addr, "/").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert_eq!(response.body_text(), "<h1>home</h1>");
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_root_without_index_lists_directory() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));
    let body = response.body_text();
    assert!(body.contains("Directory listing for /"));
    assert!(body.contains("<a href=\"app.js\">app.js</a>"));
    assert!(body.contains("<a href=\"docs/\">docs/</a>"));
    assert!(body.contains("<a href=\"hello.txt\">hello.txt</a>"));
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/docs?tab=1").await;
    assert_eq!(response.status, 301);
    assert_eq!(response.header("location"), Some("/docs/?tab=1"));
    assert_eq!(response.header("content-length"), Some("0"));
    response.assert_cors_headers();

    let listing = get(addr, "/docs/").await;
    assert_eq!(listing.status, 200);
    assert!(listing.body_text().contains("guide.md"));
}

#[tokio::test]
async fn test_file_with_trailing_slash_is_404() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/hello.txt/").await;
    assert_eq!(response.status, 404);
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_options_is_not_implemented_but_stamped() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = send(
        addr,
        "OPTIONS",
        "/hello.txt",
        &[("Origin", "http://localhost:3000"), ("Access-Control-Request-Method", "GET")],
    )
    .await;
    assert_eq!(response.status, 501);
    assert!(response.body_text().contains("Unsupported method ('OPTIONS')"));
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_head_has_headers_without_body() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = send(addr, "HEAD", "/app.js", &[]).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/javascript"));
    assert_eq!(response.header("content-length"), Some("15"));
    assert!(response.body.is_empty());
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_traversal_stays_in_root() {
    let outer = tempfile::tempdir().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
    let root = outer.path().join("public");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("secret.txt"), "public copy").unwrap();
    let addr = start(&root).await;

    for target in ["/../secret.txt", "/%2e%2e/secret.txt", "/a/../../secret.txt"] {
        let response = get(addr, target).await;
        assert_eq!(response.status, 200, "{target}");
        assert_eq!(response.body_text(), "public copy", "{target}");
    }
}

#[tokio::test]
async fn test_percent_encoded_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
    let addr = start(dir.path()).await;

    let response = get(addr, "/my%20file.txt?cache=bust").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body_text(), "spaced");
}

#[tokio::test]
async fn test_if_modified_since() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let fresh = send(
        addr,
        "GET",
        "/hello.txt",
        &[("If-Modified-Since", "Fri, 01 Jan 2100 00:00:00 GMT")],
    )
    .await;
    assert_eq!(fresh.status, 304);
    assert!(fresh.body.is_empty());
    fresh.assert_cors_headers();

    let stale = send(
        addr,
        "GET",
        "/hello.txt",
        &[("If-Modified-Since", "Thu, 01 Jan 1970 00:00:00 GMT")],
    )
    .await;
    assert_eq!(stale.status, 200);
    assert_eq!(stale.body, b"hi");

    let etag_wins = send(
        addr,
        "GET",
        "/hello.txt",
        &[
            ("If-Modified-Since", "Fri, 01 Jan 2100 00:00:00 GMT"),
            ("If-None-Match", "\"whatever\""),
        ],
    )
    .await;
    assert_eq!(etag_wins.status, 200);
}

#[tokio::test]
async fn test_keep_alive_serves_multiple_requests() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /hello.txt HTTP/1.1\r\nHost: {addr}\r\n\r\nGET /hello.txt HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let text = String::from_utf8_lossy(&raw);
    assert_eq!(text.matches("HTTP/1.1 200 OK").count(), 2);
    assert_eq!(text.to_ascii_lowercase().matches("access-control-allow-origin: *").count(), 2);
}

#[tokio::test]
async fn test_http10_request() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /hello.txt HTTP/1.0\r\n\r\n").await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let response = parse_response(&raw);
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hi");
    response.assert_cors_headers();
}

#[tokio::test]
async fn test_aborted_client_does_not_stop_server() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /hello.tx").await.unwrap();
    }

    let response = get(addr, "/hello.txt").await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_second_bind_on_same_port_fails() {
    let dir = fixture();
    let first = CorsServer::bind(config_for(dir.path())).unwrap();
    let addr = first.local_addr().unwrap();

    let mut cfg = config_for(dir.path());
    cfg.server.port = addr.port();
    let err = CorsServer::bind(cfg).err().expect("second bind must fail");
    assert!(matches!(err, ServerError::Bind { .. }));
    assert!(err.is_addr_in_use());
}

#[tokio::test]
async fn test_missing_root_fails_before_binding() {
    let dir = tempfile::tempdir().unwrap();
    let err = CorsServer::bind(config_for(&dir.path().join("missing")))
        .err()
        .expect("missing root must fail");
    assert!(matches!(err, ServerError::Root { .. }));
}

#[tokio::test]
async fn test_missing_backslash_name_is_404() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/missing%5Cx.txt").await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("location"), None);
    response.assert_cors_headers();
}

#[cfg(unix)]
#[tokio::test]
async fn test_backslash_name_is_served() {
    let dir = fixture();
    std::fs::write(dir.path().join("a\\b.txt"), "backslash").unwrap();
    let addr = start(dir.path()).await;

    let response = get(addr, "/a%5Cb.txt").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"backslash");
}

#[tokio::test]
async fn test_nul_in_path_is_404() {
    let dir = fixture();
    let addr = start(dir.path()).await;

    let response = get(addr, "/hello.txt%00").await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("location"), None);
    response.assert_cors_headers();

    let response = get(addr, "/docs%00/guide.md").await;
    assert_eq!(response.status, 404);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_to_outside_file_is_followed() {
    let dir = fixture();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("shared.txt");
    std::fs::write(&target, "from outside").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("linked.txt")).unwrap();
    let addr = start(dir.path()).await;

    let response = get(addr, "/linked.txt").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"from outside");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    response.assert_cors_headers();

    let listing = get(addr, "/").await;
    assert!(listing.body_text().contains("linked.txt@"));
}
