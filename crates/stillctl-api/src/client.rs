// Device HTTP client
//
// Wraps `reqwest::Client` with the controller firmware's four endpoints.
// Every method returns `Result` and never panics on a bad response: the
// poll loop above decides what a failure means for the UI.

use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{Ack, DataResponse};
use crate::payload::{FormPayload, SubmitEncoding};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in an error message.
const BODY_PREVIEW: usize = 200;

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Raw HTTP client for a still/brew controller.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the device root, e.g. `http://192.168.4.1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash or a sub-path on
    /// the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /data?cfg={0,1}`: live telemetry, plus the config block when
    /// `want_config` is set and the firmware chooses to include it.
    pub async fn fetch_data(&self, want_config: bool) -> Result<DataResponse, Error> {
        let mut url = self.endpoint("data")?;
        url.query_pairs_mut()
            .append_pair("cfg", if want_config { "1" } else { "0" });
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = Self::checked_body(resp).await?;

        serde_json::from_str::<DataResponse>(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// `POST /cfg`: configuration change.
    pub async fn submit_config(
        &self,
        payload: &FormPayload,
        encoding: SubmitEncoding,
    ) -> Result<Ack, Error> {
        self.submit("cfg", payload, encoding).await
    }

    /// `POST /run`: runtime command (valve pulse, heat toggle).
    pub async fn submit_command(
        &self,
        payload: &FormPayload,
        encoding: SubmitEncoding,
    ) -> Result<Ack, Error> {
        self.submit("run", payload, encoding).await
    }

    /// `GET /oplog`: the plain-text operation log, verbatim.
    pub async fn fetch_log(&self) -> Result<String, Error> {
        let url = self.endpoint("oplog")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        Self::checked_body(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn submit(
        &self,
        path: &str,
        payload: &FormPayload,
        encoding: SubmitEncoding,
    ) -> Result<Ack, Error> {
        let url = self.endpoint(path)?;
        debug!(fields = payload.len(), ?encoding, "POST {}", url);

        let builder = match encoding {
            SubmitEncoding::Form => self.http.post(url).form(&payload.to_form_pairs()),
            SubmitEncoding::Json => self.http.post(url).json(&payload.to_json()),
        };
        let resp = builder.send().await?;
        let body = Self::checked_body(resp).await?;
        trace!(body = preview(&body), "submission acknowledged");

        let ack = Ack::from_body(&body);
        if ack.is_ok() {
            Ok(ack)
        } else {
            Err(Error::Rejected {
                status: ack.status.unwrap_or_default(),
            })
        }
    }

    /// Read the body of a successful response, or turn a non-2xx status
    /// into `Error::Http`.
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DeviceClient {
        DeviceClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            client("http://192.168.4.1/").endpoint("data").unwrap().as_str(),
            "http://192.168.4.1/data"
        );
        assert_eq!(
            client("http://host/still").endpoint("oplog").unwrap().as_str(),
            "http://host/still/oplog"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let p = preview(&body);
        assert!(p.len() <= BODY_PREVIEW);
        assert!(body.starts_with(p));
    }
}
