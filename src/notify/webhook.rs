use super::message::Notification;
use super::{Channel, NotificationSink};
use crate::error::{NotifyError, Result};

pub struct WebhookSink {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl NotificationSink for WebhookSink {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        let payload = serde_json::json!({
            "kind": notification.kind,
            "subject": notification.subject,
            "body": notification.body,
            "recipient": notification.recipient,
            "timestamp": notification.timestamp,
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::WebhookSend(e.to_string()))?;

        log::info!("Delivered '{}' to {}", notification.subject, self.url);
        Ok(())
    }

    fn channel(&self) -> Channel {
        Channel::Webhook(self.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use chrono::NaiveDate;

    use super::*;
    use crate::error::LarderError;
    use crate::notify::message::test_notice;

    /// Accept one request, answer with `status`, and hand back the raw request.
    fn serve_once(status: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let reply = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            stream.write_all(reply.as_bytes()).unwrap();
            String::from_utf8(raw).unwrap()
        });
        (url, handle)
    }

    fn notice() -> Notification {
        let now = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        test_notice(Some("hem@example.com"), now)
    }

    #[test]
    fn test_posts_json_payload() {
        let (url, server) = serve_once("200 OK");
        let sink = WebhookSink::new(url.clone());
        sink.deliver(&notice()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /hook "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let payload: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(payload["kind"], "test");
        assert_eq!(payload["subject"], "Matförvaring - Testmeddelande");
        assert!(payload["body"].as_str().unwrap().contains("Aviseringarna fungerar."));
        assert_eq!(payload["recipient"], "hem@example.com");
        assert_eq!(payload["timestamp"], "2024-03-20 08:00:00");
        assert_eq!(sink.channel(), Channel::Webhook(url));
    }

    #[test]
    fn test_error_status_is_a_send_failure() {
        let (url, server) = serve_once("500 Internal Server Error");
        let err = WebhookSink::new(url).deliver(&notice()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, LarderError::Notify(NotifyError::WebhookSend(_))));
    }

    #[test]
    fn test_unreachable_endpoint_is_a_send_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        drop(listener);
        let err = WebhookSink::new(url).deliver(&notice()).unwrap_err();
        assert!(matches!(err, LarderError::Notify(NotifyError::WebhookSend(_))));
    }
}
