// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &ApiConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fail with the status code if the response is not a success.
pub fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Check the status, then decode the body as JSON.
///
/// A body that does not decode is an unexpected payload, not a transport error.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response)?;
    let url = response.url().to_string();
    let text = response.text().await?;
    decode_json(&text).map_err(|e| AppError::payload(format!("{url}: {e}")))
}

/// Decode a JSON body.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

/// Require the `status` field of a directory envelope to be `success`.
pub fn ensure_api_success(status: &str, context: &str) -> Result<()> {
    if status.is_empty() || status == "success" {
        Ok(())
    } else {
        Err(AppError::payload(format!("{context}: status '{status}'")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::StoryPage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request with a canned response.
    ///
    /// Returns the base URL to call and a handle yielding the raw request.
    pub(crate) async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        (format!("http://{addr}/"), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    async fn get(base: &str) -> Response {
        let client = create_client(&ApiConfig::default()).unwrap();
        client.get(base).send().await.unwrap()
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let (base, server) = serve_once("500 Internal Server Error", "text/plain", "boom").await;

        let result: Result<StoryPage> = read_json(get(&base).await).await;

        server.await.unwrap();
        assert!(matches!(result, Err(AppError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_html_body_is_payload() {
        let (base, server) = serve_once("200 OK", "text/html", "<html>maintenance</html>").await;

        let result: Result<StoryPage> = read_json(get(&base).await).await;

        server.await.unwrap();
        match result {
            Err(AppError::Payload(message)) => assert!(message.contains(&base)),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_json_body_decodes() {
        let (base, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"status":"success","total_pages":3,"user_stories":[]}"#,
        )
        .await;

        let page: StoryPage = read_json(get(&base).await).await.unwrap();

        server.await.unwrap();
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = create_client(&ApiConfig::default()).unwrap();
        let error = AppError::from(client.get(&base).send().await.unwrap_err());

        assert!(error.is_transport());
    }

    #[test]
    fn test_create_client() {
        assert!(create_client(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_decode_json_rejects_html() {
        let result: Result<StoryPage> = decode_json("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(AppError::Json(_))));
    }

    #[test]
    fn test_api_status() {
        assert!(ensure_api_success("success", "stories").is_ok());
        assert!(ensure_api_success("", "stories").is_ok());
        assert!(matches!(
            ensure_api_success("fail", "stories"),
            Err(AppError::Payload(_))
        ));
    }
}
