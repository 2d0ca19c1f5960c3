//! Request dispatch: virtual host, location, processor pipeline, fallback

use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use pinginx_core::config::{DEFAULT_LISTEN_PORT, Location, ServerDefinition};
use pinginx_core::{Listeners, Reply, RequestInfo, VirtualHosts};
use pinginx_static::{WELCOME_CONTENT_TYPE, WELCOME_PAGE};
use tracing::debug;

/// Run one request through the routing tables of its port.
pub async fn route(hosts: &VirtualHosts, request: &RequestInfo) -> Reply {
    let mut reply = Reply::new();

    let Some(server) = hosts.dispatch(request.host.as_deref().unwrap_or_default()) else {
        fallback(&mut reply, request);
        return reply;
    };

    match server.find_location(&request.path) {
        Some(location) => {
            debug!(
                server = server.name(),
                location = %location.path,
                "{} {}", request.method, request.path
            );
            location.execute(&mut reply, request).await;
        }
        None => debug!(server = server.name(), "No location for {}", request.path),
    }

    if reply.is_untouched() {
        fallback(&mut reply, request);
    }
    if reply.forward_target().is_none() && !reply.body().is_empty() {
        reply.set_default_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
    }

    reply
}

/// Welcome page for `/`, 404 for everything else
fn fallback(reply: &mut Reply, request: &RequestInfo) {
    if request.path == "/" {
        reply.set_status(StatusCode::OK);
        reply.set_default_header(CONTENT_TYPE, HeaderValue::from_static(WELCOME_CONTENT_TYPE));
        reply.set_body(WELCOME_PAGE);
    } else {
        reply.not_found();
    }
}

/// Server used when the configuration defines none: port 8000, `location /`
pub fn default_server() -> ServerDefinition {
    let mut server = ServerDefinition {
        listen_port: DEFAULT_LISTEN_PORT,
        ..Default::default()
    };
    if let Ok(location) = Location::new(0, None, "/") {
        server.locations.push(location);
    }
    server
}

/// Group compiled servers by port, falling back to [`default_server`]
pub fn build_listeners(servers: Vec<ServerDefinition>) -> Listeners {
    if servers.is_empty() {
        tracing::warn!("No servers configured, using the default server");
        return Listeners::from_servers([default_server()]);
    }
    Listeners::from_servers(servers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinginx_config::compile;

    fn hosts(source: &str) -> VirtualHosts {
        let listeners = build_listeners(compile(source).unwrap());
        listeners.into_hosts().next().unwrap()
    }

    #[tokio::test]
    async fn test_return() {
        let hosts = hosts(r#"server { listen 8080; location / { return 200 "ok"; } }"#);
        let reply = route(&hosts, &RequestInfo::get("/")).await;

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), b"ok");
        assert_eq!(reply.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_proxy_pass() {
        let hosts =
            hosts("server { listen 8080; location /api { proxy_pass http://backend:9000/v1; } }");
        let reply = route(&hosts, &RequestInfo::get("/api/users")).await;

        let target = reply.forward_target().unwrap();
        assert_eq!(target.authority, "backend:9000");
        assert_eq!(target.path, "/v1/users");
        assert!(reply.header("content-type").is_none());
    }

    #[tokio::test]
    async fn test_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/app.js"), "console.log(1);").unwrap();

        let source = format!(
            "server {{ listen 8080; location /static {{ root {}; }} }}",
            dir.path().display()
        );
        let reply = route(&hosts(&source), &RequestInfo::get("/static/app.js")).await;

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), b"console.log(1);");
        assert_eq!(reply.header("content-type"), Some("text/javascript"));
    }

    #[tokio::test]
    async fn test_fallbacks() {
        let hosts = hosts("server { location /api { default_type application/json; } }");

        let reply = route(&hosts, &RequestInfo::get("/")).await;
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), WELCOME_PAGE.as_bytes());

        let reply = route(&hosts, &RequestInfo::get("/missing")).await;
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);

        let reply = route(&hosts, &RequestInfo::get("/api/x")).await;
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_continuations_then_terminal() {
        let hosts = hosts(
            "server { location / { return 201 done; echo 'hi $request'; default_type text/x-test; } }",
        );
        let reply = route(&hosts, &RequestInfo::get("/e")).await;

        assert_eq!(reply.status(), StatusCode::CREATED);
        assert_eq!(reply.body(), b"hi GET /e HTTP/1.1\ndone");
        assert_eq!(reply.header("content-type"), Some("text/x-test"));
    }

    #[tokio::test]
    async fn test_virtual_hosts() {
        let hosts = hosts(
            "server { listen 8080; server_name a.com; location / { return 200 a; } }
             server { listen 8080; server_name *.b.com; location / { return 200 b; } }",
        );

        let reply = route(&hosts, &RequestInfo::get("/").with_host("www.b.com:8080")).await;
        assert_eq!(reply.body(), b"b");

        let reply = route(&hosts, &RequestInfo::get("/").with_host("A.COM")).await;
        assert_eq!(reply.body(), b"a");

        let reply = route(&hosts, &RequestInfo::get("/")).await;
        assert_eq!(reply.body(), b"a");
    }

    #[tokio::test]
    async fn test_default_server() {
        let listeners = build_listeners(Vec::new());
        assert_eq!(listeners.ports().collect::<Vec<_>>(), vec![8000]);

        let hosts = listeners.get(8000).unwrap();
        let reply = route(hosts, &RequestInfo::get("/")).await;
        assert_eq!(reply.body(), WELCOME_PAGE.as_bytes());
    }
}
