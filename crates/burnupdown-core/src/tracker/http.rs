//! Authenticated GET requests shared by both tracker API generations.

use chrono::FixedOffset;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::TrackerError;

/// Page window every listing request asks for.
pub const PAGE_PARAMS: [(&str, &str); 2] = [("startAt", "0"), ("maxResults", "1000")];

#[derive(Debug, Clone)]
pub struct JiraHttp {
    base: Url,
    client: Client,
    username: String,
    password: String,
    offset: FixedOffset,
}

impl JiraHttp {
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        offset: FixedOffset,
    ) -> Result<Self, TrackerError> {
        if username.is_empty() {
            return Err(TrackerError::NotConnected);
        }
        // Without a trailing slash `join` would replace the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|source| TrackerError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            base,
            client: Client::new(),
            username: username.to_string(),
            password: password.to_string(),
            offset,
        })
    }

    /// Offset every decoded timestamp is expressed in.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T, TrackerError> {
        let url = self
            .base
            .join(resource)
            .map_err(|source| TrackerError::InvalidUrl {
                url: resource.to_string(),
                source,
            })?;
        tracing::debug!(%url, ?params, "tracker request");

        let resp = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TrackerError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| TrackerError::Payload(format!("{resource}: {e}")))
    }
}

/// Listing params followed by `extra`.
pub fn paged<'a>(extra: impl IntoIterator<Item = (&'a str, String)>) -> Vec<(&'a str, String)> {
    PAGE_PARAMS
        .iter()
        .map(|&(key, value)| (key, value.to_string()))
        .chain(extra)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn base_url_keeps_its_path() {
        let http = JiraHttp::new("http://tracker.local/jira", "me", "", utc()).unwrap();
        let url = http.base.join("rest/api/2/search").unwrap();
        assert_eq!(url.as_str(), "http://tracker.local/jira/rest/api/2/search");
    }

    #[test]
    fn paged_params_come_first() {
        let params = paged([("jql", "sprint = 3".to_string())]);
        assert_eq!(params[0], ("startAt", "0".to_string()));
        assert_eq!(params[1], ("maxResults", "1000".to_string()));
        assert_eq!(params[2], ("jql", "sprint = 3".to_string()));
    }

    #[test]
    fn empty_username_is_not_connected() {
        assert!(matches!(
            JiraHttp::new("http://tracker.local", "", "", utc()),
            Err(TrackerError::NotConnected)
        ));
    }

    #[test]
    fn bad_url_is_rejected() {
        assert!(matches!(
            JiraHttp::new("not a url", "me", "", utc()),
            Err(TrackerError::InvalidUrl { .. })
        ));
    }
}
