#![allow(dead_code)]

pub mod fixtures {
    use std::path::{Path, PathBuf};

    pub const ANA_AND_BO: &str = r#"[{"id":1,"name":"Ana"},{"id":2,"name":"Bo"}]"#;

    /// Write `json` as `users.json` under `dir` and return its path.
    pub fn write_users(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("users.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    /// Create `dir/views` holding `files` and return its path.
    pub fn write_views(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
        let views = dir.join("views");
        std::fs::create_dir_all(&views).unwrap();
        for (name, body) in files {
            std::fs::write(views.join(name), body).unwrap();
        }
        views
    }
}

pub mod test_server {
    use roster::app::App;
    use roster::config::AppConfig;
    use roster::server::ServerHandle;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x10000);
        });
    }

    /// A running app on a free port; stops the server on drop.
    pub struct TestServer {
        pub app: App,
        handle: Option<ServerHandle>,
        pub addr: SocketAddr,
    }

    impl TestServer {
        pub fn start(mut config: AppConfig) -> Self {
            setup_may_runtime();
            config.http.addr = "127.0.0.1:0".to_string();
            let app = App::from_config(config).unwrap();
            let handle = app.start().unwrap();
            handle.wait_ready().unwrap();
            let addr = handle.addr();
            Self {
                app,
                handle: Some(handle),
                addr,
            }
        }

        pub fn get(&self, path: &str) -> HttpResponse {
            self.request("GET", path)
        }

        pub fn request(&self, method: &str, path: &str) -> HttpResponse {
            let raw = send_request(
                &self.addr,
                &format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
            );
            HttpResponse::parse(&raw)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 4096];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&tmp[..n]);
                    if HttpResponse::is_complete(&buf) {
                        break;
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    #[derive(Debug)]
    pub struct HttpResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl HttpResponse {
        pub fn parse(raw: &str) -> Self {
            let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
            let mut lines = head.lines();
            let status = lines
                .next()
                .and_then(|l| l.split_whitespace().nth(1))
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let headers = lines
                .filter_map(|l| l.split_once(':'))
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                .collect();
            Self {
                status,
                headers,
                body: body.to_string(),
            }
        }

        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap_or_default()
        }

        fn is_complete(buf: &[u8]) -> bool {
            let text = String::from_utf8_lossy(buf);
            let Some((head, body)) = text.split_once("\r\n\r\n") else {
                return false;
            };
            head.lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .is_some_and(|len| body.len() >= len)
        }
    }
}
