//! Blocking HTTP implementation of [`DataApiClient`].
//!
//! Speaks the data API's JSON 1.1 protocol: every call is a `POST /` whose operation is
//! selected by the `X-Amz-Target` header. Request signing is left to the endpoint, which
//! is expected to be a signing proxy or a local emulator.

use reqwest::blocking::Client;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{DataApiClient, ExecuteStatementRequest, StatementDescription};
use super::error::{Error, Result};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "RedshiftData";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExecuteStatementResponse {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStatementRequest<'a> {
    id: &'a str,
}

/// Data API client backed by `reqwest`.
pub struct HttpDataApiClient {
    endpoint: String,
    client: Client,
}

impl HttpDataApiClient {
    /// Creates a client for `endpoint`, optionally sending `token` as a bearer credential.
    pub fn new(endpoint: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(CONTENT_TYPE),
        );
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    fn call<B: Serialize, T: DeserializeOwned>(&self, operation: &str, body: &B) -> Result<T> {
        debug!("POST {} {TARGET_PREFIX}.{operation}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(serde_json::to_vec(body)?)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl DataApiClient for HttpDataApiClient {
    fn execute_statement(&self, request: &ExecuteStatementRequest) -> Result<String> {
        let response: ExecuteStatementResponse = self.call("ExecuteStatement", request)?;
        Ok(response.id)
    }

    fn describe_statement(&self, id: &str) -> Result<StatementDescription> {
        self.call("DescribeStatement", &DescribeStatementRequest { id })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::unload::StatementStatus;

    /// Serves a single request with `status` and `body`, handing back the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: {CONTENT_TYPE}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();

            head + String::from_utf8(payload).unwrap().as_str()
        });
        (format!("http://{addr}/"), handle)
    }

    #[test]
    fn test_execute_statement() {
        let (endpoint, server) = serve_once("200 OK", r#"{"Id":"exec-42","Database":"dev"}"#);
        let client = HttpDataApiClient::new(endpoint, Some("secret")).unwrap();
        let request = ExecuteStatementRequest {
            cluster_identifier: String::from("cluster-1"),
            database: String::from("dev"),
            db_user: String::from("awsuser"),
            sql: String::from("select 1"),
        };

        let id = client.execute_statement(&request).unwrap();
        assert_eq!(id, "exec-42");

        let raw = server.join().unwrap().to_lowercase();
        assert!(raw.starts_with("post / "));
        assert!(raw.contains("x-amz-target: redshiftdata.executestatement"));
        assert!(raw.contains("authorization: bearer secret"));
        assert!(raw.contains(r#""clusteridentifier":"cluster-1""#));
    }

    #[test]
    fn test_describe_statement() {
        let (endpoint, server) = serve_once("200 OK", r#"{"Id":"exec-42","Status":"RUNNING"}"#);
        let client = HttpDataApiClient::new(endpoint, None).unwrap();

        let desc = client.describe_statement("exec-42").unwrap();
        assert_eq!(desc.status, StatementStatus::Running);

        let raw = server.join().unwrap();
        assert!(raw.contains(r#"{"Id":"exec-42"}"#));
    }

    #[test]
    fn test_api_error_is_propagated() {
        let (endpoint, server) = serve_once(
            "400 Bad Request",
            r#"{"__type":"ValidationException","message":"bad id"}"#,
        );
        let client = HttpDataApiClient::new(endpoint, None).unwrap();

        let err = client.describe_statement("nope").unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, ref message } if message.contains("bad id")));
        server.join().unwrap();
    }
}
