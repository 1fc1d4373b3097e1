//! Messages exchanged between the background context and the popup

use crate::cookie::CookieRecord;
use crate::gateway::CookieGateway;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Full cookie set of the active page after a relevant change. A refresh, not a diff.
    CookiesChanged { cookies: Vec<CookieRecord> },
    /// Request for the cookies of `url`, answered with a [`GetCookiesResponse`].
    GetCookies { url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCookiesResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<CookieRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Answer a request message. Returns `None` for messages that expect no reply.
pub async fn respond(gateway: &CookieGateway, message: &Message) -> Option<GetCookiesResponse> {
    let Message::GetCookies { url } = message else {
        return None;
    };

    let response = match gateway.get_all(url).await {
        Ok(cookies) => GetCookiesResponse {
            success: true,
            cookies: Some(cookies),
            error: None,
        },
        Err(err) => {
            log::warn!("getCookies for {} failed: {}", url, err);
            GetCookiesResponse {
                success: false,
                cookies: None,
                error: Some(err.to_string()),
            }
        }
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_use_type_tag() {
        let message = Message::GetCookies {
            url: "https://example.com/".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"type": "getCookies", "url": "https://example.com/"})
        );

        let parsed: Message =
            serde_json::from_value(json!({"type": "cookiesChanged", "cookies": []}))
                .expect("parse");
        assert_eq!(parsed, Message::CookiesChanged { cookies: vec![] });
    }

    #[test]
    fn failed_response_omits_cookies() {
        let response = GetCookiesResponse {
            success: false,
            cookies: None,
            error: Some("boom".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({"success": false, "error": "boom"})
        );
    }

    #[tokio::test]
    async fn respond_reports_unavailable_host() {
        let gateway = CookieGateway::unavailable();
        let response = respond(
            &gateway,
            &Message::GetCookies {
                url: "https://example.com/".to_string(),
            },
        )
        .await
        .expect("response");
        assert!(!response.success);
        assert!(response.error.is_some());

        let ignored = respond(&gateway, &Message::CookiesChanged { cookies: vec![] }).await;
        assert!(ignored.is_none());
    }
}
