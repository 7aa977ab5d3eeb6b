use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

/// Where a document is read from: a blank input resolves to the conventional
/// file name, `http(s)://` goes over the network, anything else is a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentLocation {
    Http(String),
    File(PathBuf),
}

impl DocumentLocation {
    pub fn resolve(raw: &str, fallback: &str) -> Self {
        let raw = raw.trim();
        let raw = if raw.is_empty() { fallback } else { raw };

        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Http(raw.to_owned())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub(super) fn fetch_text(location: &DocumentLocation) -> Result<String> {
    match location {
        DocumentLocation::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        DocumentLocation::Http(url) => {
            let response =
                reqwest::blocking::get(url).with_context(|| format!("failed to fetch {url}"))?;
            let status = response.status();
            if !status.is_success() {
                return Err(anyhow!("HTTP error {status} while fetching {url}"));
            }
            response
                .text()
                .with_context(|| format!("response body from {url} was not valid text"))
        }
    }
}

/// Minimal HTTP/1.1 responder for tests: serves fixed bodies by request
/// path and answers 404 for anything else.
#[cfg(test)]
pub(super) mod test_server {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    pub(in crate::load) fn serve(routes: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header == "\r\n" => break,
                        Ok(_) => {}
                    }
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .iter()
                    .find(|(route, _)| *route == path)
                    .map_or(("404 Not Found", ""), |(_, body)| ("200 OK", *body));
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_uses_fallback_name() {
        assert_eq!(
            DocumentLocation::resolve("   ", "trace.json"),
            DocumentLocation::File(PathBuf::from("trace.json"))
        );
    }

    #[test]
    fn urls_are_fetched_over_http() {
        assert_eq!(
            DocumentLocation::resolve(" http://localhost:8080/graph.json ", "graph.json"),
            DocumentLocation::Http("http://localhost:8080/graph.json".to_owned())
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = DocumentLocation::File(dir.path().join("absent.json"));
        let error = fetch_text(&location).unwrap_err();
        assert!(error.to_string().contains("absent.json"));
    }

    #[test]
    fn http_document_is_fetched() {
        let base = test_server::serve(vec![("/graph.json", r#"{ "glyphs": [], "edges": [] }"#)]);
        let location = DocumentLocation::resolve(&format!("{base}/graph.json"), "graph.json");

        let text = fetch_text(&location).unwrap();
        assert!(text.contains("glyphs"));
    }

    #[test]
    fn http_error_status_is_an_error() {
        let base = test_server::serve(Vec::new());
        let location = DocumentLocation::resolve(&format!("{base}/graph.json"), "graph.json");

        let error = fetch_text(&location).unwrap_err();
        assert!(error.to_string().contains("404"));
    }
}
