use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;

struct TestServer {
    process: Child,
    _config: NamedTempFile,
}

impl TestServer {
    fn new(config_body: &str) -> Self {
        let config = write_config(config_body);

        // Start server using the compiled binary (avoids cargo lock issues)
        let process = Command::new(env!("CARGO_BIN_EXE_pinginx"))
            .arg("run")
            .arg("-c")
            .arg(config.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start server");

        Self {
            process,
            _config: config,
        }
    }

    fn dump_output(&mut self) {
        if let Some(mut stderr) = self.process.stderr.take() {
            let mut s = String::new();
            let _ = stderr.read_to_string(&mut s);
            eprintln!("STDERR:\n{}", s);
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

fn write_config(body: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), body).unwrap();
    file
}

async fn wait_for_server(url: &str, server: &mut TestServer) -> bool {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(Some(status)) = server.process.try_wait() {
            eprintln!("Server exited unexpectedly with status: {}", status);
            server.dump_output();
            return false;
        }

        if client.get(url).send().await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    eprintln!("Timeout waiting for server!");
    false
}

#[tokio::test]
async fn test_return_directive() {
    let mut server = TestServer::new(
        r#"
        server {
            listen 9191;
            location / { return 200 "ok"; }
            location = /moved { return 301 /new; }
        }
        "#,
    );
    assert!(wait_for_server("http://127.0.0.1:9191/", &mut server).await, "Server failed to start");

    let resp = reqwest::get("http://127.0.0.1:9191/anything").await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["server"], "pinginx");
    assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(resp.text().await.unwrap(), "ok");

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = client.get("http://127.0.0.1:9191/moved").send().await.unwrap();
    assert_eq!(resp.status(), 301);
    assert_eq!(resp.headers()["location"], "/new");
}

#[tokio::test]
async fn test_static_file_server() {
    let tmp_dir = tempfile::tempdir().unwrap();
    std::fs::write(tmp_dir.path().join("index.html"), "<h1>Hello World</h1>").unwrap();
    let root_path = tmp_dir.path().to_str().unwrap().replace('\\', "/");

    let config = format!(
        r#"
        server {{
            listen 9192;
            location / {{ root "{}"; }}
        }}
        "#,
        root_path
    );
    let mut server = TestServer::new(&config);
    assert!(
        wait_for_server("http://127.0.0.1:9192/index.html", &mut server).await,
        "Server failed to start"
    );

    let resp = reqwest::get("http://127.0.0.1:9192/index.html").await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert!(resp.headers().contains_key("last-modified"));
    assert_eq!(resp.text().await.unwrap(), "<h1>Hello World</h1>");

    let resp = reqwest::get("http://127.0.0.1:9192/missing.txt").await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "404 page not found\n");
}

#[tokio::test]
async fn test_proxy_pass_and_virtual_hosts() {
    let mut server = TestServer::new(
        r#"
        http {
            server {
                listen 9193;
                location / { echo "backend $request"; }
            }
            server {
                listen 9194;
                server_name front.test;
                location /api { proxy_pass http://127.0.0.1:9193/v1; }
            }
            server {
                listen 9194;
                server_name *.other.test;
                location / { return 200 other; }
            }
        }
        "#,
    );
    assert!(wait_for_server("http://127.0.0.1:9193/", &mut server).await, "Server failed to start");
    assert!(wait_for_server("http://127.0.0.1:9194/", &mut server).await, "Server failed to start");

    let client = reqwest::Client::new();
    let resp = client
        .get("http://127.0.0.1:9194/api/users?page=2")
        .header("Host", "front.test")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "backend GET /v1/users?page=2 HTTP/1.1\n");

    let resp = client
        .get("http://127.0.0.1:9194/api/users")
        .header("Host", "www.other.test")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "other");
}

#[test]
fn test_validate_command() {
    let good = write_config("server { listen 8080; location / { return 200 ok; } }");
    let status = Command::new(env!("CARGO_BIN_EXE_pinginx"))
        .args(["validate", "-c"])
        .arg(good.path())
        .status()
        .unwrap();
    assert!(status.success());

    let bad = write_config("server {\n    listen 8080\n}\n");
    let output = Command::new(env!("CARGO_BIN_EXE_pinginx"))
        .args(["validate", "-c"])
        .arg(bad.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing ';'"), "{}", stderr);
}

#[test]
fn test_dump_command() {
    let config = write_config("server { listen 8080; }");
    let output = Command::new(env!("CARGO_BIN_EXE_pinginx"))
        .args(["dump", "-c"])
        .arg(config.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree[0]["words"][0], "server");
    assert_eq!(tree[0]["block"][0]["words"][1], "8080");
}
