//! Aliyun OSS client
//!
//! Speaks the OSS REST API directly with header signatures (V1):
//! `Authorization: OSS <AccessKeyId>:<base64(HMAC-SHA1(secret, string-to-sign))>`

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use sha1::Sha1;

use super::{ObjectPage, ObjectStore, OssSettings};
use crate::error::{Result, SshSyncError};

type HmacSha1 = Hmac<Sha1>;

const OCTET_STREAM: &str = "application/octet-stream";

static KEY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Key>([^<]*)</Key>").expect("valid pattern"));
static TRUNCATED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<IsTruncated>\s*true\s*</IsTruncated>").expect("valid pattern"));
static NEXT_MARKER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<NextMarker>([^<]*)</NextMarker>").expect("valid pattern"));
static CODE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Code>([^<]*)</Code>").expect("valid pattern"));
static MESSAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Message>([^<]*)</Message>").expect("valid pattern"));

/// Client for one OSS bucket
pub struct OssClient {
    http: reqwest::Client,
    access_key_id: String,
    access_key_secret: String,
    bucket: String,
    endpoint: String,
}

impl OssClient {
    /// Build a client from complete settings
    pub fn new(settings: &OssSettings) -> Result<Self> {
        settings.validate()?;

        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        let bucket = field(&settings.bucket);
        let region = field(&settings.region);

        Ok(Self {
            http: reqwest::Client::new(),
            access_key_id: field(&settings.access_key_id),
            access_key_secret: field(&settings.access_key_secret),
            endpoint: format!("https://{}.{}.aliyuncs.com", bucket, region),
            bucket,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorization(&self, verb: &str, content_type: &str, date: &str, resource: &str) -> Result<String> {
        let signature = sign(&self.access_key_secret, verb, content_type, date, resource)?;
        Ok(format!("OSS {}:{}", self.access_key_id, signature))
    }

    /// Signed request for `key` (empty key addresses the bucket itself)
    fn request(&self, method: Method, key: &str, content_type: &str) -> Result<RequestBuilder> {
        let date = http_date();
        let resource = format!("/{}/{}", self.bucket, key);
        let auth = self.authorization(method.as_str(), content_type, &date, &resource)?;
        let url = format!("{}/{}", self.endpoint, key);

        let mut builder = self
            .http
            .request(method, url)
            .header("Date", date)
            .header("Authorization", auth);
        if !content_type.is_empty() {
            builder = builder.header("Content-Type", content_type);
        }
        Ok(builder)
    }
}

impl Drop for OssClient {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.access_key_secret.zeroize();
    }
}

/// Current time in RFC 1123 form, as OSS expects in the `Date` header
fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Signature over `VERB\nContent-MD5\nContent-Type\nDate\nResource`
fn sign(secret: &str, verb: &str, content_type: &str, date: &str, resource: &str) -> Result<String> {
    let string_to_sign = format!("{}\n\n{}\n{}\n{}", verb, content_type, date, resource);
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| SshSyncError::InvalidConfig(format!("bad access key secret: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Read keys and continuation marker from a ListBucketResult document
fn parse_list_response(xml: &str) -> ObjectPage {
    let keys = KEY_TAG
        .captures_iter(xml)
        .map(|caps| unescape_xml(&caps[1]))
        .collect();
    let next_marker = if TRUNCATED_TAG.is_match(xml) {
        NEXT_MARKER_TAG
            .captures(xml)
            .map(|caps| unescape_xml(&caps[1]))
            .filter(|marker| !marker.is_empty())
    } else {
        None
    };
    ObjectPage { keys, next_marker }
}

/// Turn an OSS error reply into a tagged storage error
fn parse_error(status: StatusCode, body: &str) -> SshSyncError {
    let code = CODE_TAG
        .captures(body)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| format!("Http{}", status.as_u16()));
    let message = MESSAGE_TAG
        .captures(body)
        .map(|caps| unescape_xml(&caps[1]))
        .unwrap_or_else(|| status.to_string());
    SshSyncError::storage(code, message)
}

fn request_failed(e: reqwest::Error) -> SshSyncError {
    SshSyncError::storage("RequestFailed", e.to_string())
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    builder.send().await.map_err(request_failed)
}

async fn error_from(response: Response) -> SshSyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    parse_error(status, &body)
}

#[async_trait]
impl ObjectStore for OssClient {
    async fn list(
        &self,
        prefix: &str,
        marker: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage> {
        let max_keys = max_keys.to_string();
        let mut query = vec![("prefix", prefix), ("max-keys", max_keys.as_str())];
        if let Some(marker) = marker {
            query.push(("marker", marker));
        }

        let response = send(self.request(Method::GET, "", "")?.query(&query)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let body = response.text().await.map_err(request_failed)?;
        Ok(parse_list_response(&body))
    }

    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = send(self.request(Method::GET, key, "")?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Object {} does not exist", key);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let bytes = response.bytes().await.map_err(request_failed)?;
        Ok(Some(bytes.to_vec()))
    }

    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let response = send(self.request(Method::PUT, key, OCTET_STREAM)?.body(data)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "OtxrzxIsfpFjA7SwPzILwy8Bw21TLhquhboDYROV";
    const DATE: &str = "Thu, 17 Nov 2005 18:49:58 GMT";

    #[test]
    fn test_sign_get() {
        let signature = sign(SECRET, "GET", "", DATE, "/oss-example/nelson").unwrap();
        assert_eq!(signature, "WtqWMKN2f1rytXpaUuo/IoRFqO4=");
    }

    #[test]
    fn test_sign_put() {
        let signature = sign(
            SECRET,
            "PUT",
            OCTET_STREAM,
            DATE,
            "/oss-example/appdata/sshconfig/config",
        )
        .unwrap();
        assert_eq!(signature, "VBj8bd8SwcUTOnqi78O1S0JwGK4=");
    }

    #[test]
    fn test_http_date_shape() {
        let date = http_date();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), DATE.len());
    }

    #[test]
    fn test_parse_truncated_listing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>bucket</Name>
  <Prefix>appdata/sshconfig/</Prefix>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <NextMarker>appdata/sshconfig/keys/a&amp;b</NextMarker>
  <Contents><Key>appdata/sshconfig/config</Key><Size>10</Size></Contents>
  <Contents><Key>appdata/sshconfig/keys/a&amp;b</Key><Size>10</Size></Contents>
</ListBucketResult>"#;

        let page = parse_list_response(xml);
        assert_eq!(
            page.keys,
            vec!["appdata/sshconfig/config", "appdata/sshconfig/keys/a&b"]
        );
        assert_eq!(page.next_marker.as_deref(), Some("appdata/sshconfig/keys/a&b"));
    }

    #[test]
    fn test_parse_complete_listing() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated>\
                   <NextMarker></NextMarker></ListBucketResult>";
        assert_eq!(parse_list_response(xml), ObjectPage::default());
    }

    #[test]
    fn test_parse_error_reply() {
        let body = "<Error><Code>AccessDenied</Code><Message>denied &amp; logged</Message></Error>";
        let err = parse_error(StatusCode::FORBIDDEN, body);
        assert_eq!(err.storage_code(), Some("AccessDenied"));
        assert!(err.to_string().contains("denied & logged"));

        let err = parse_error(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.storage_code(), Some("Http502"));
    }

    #[test]
    fn test_client_requires_settings() {
        assert!(OssClient::new(&OssSettings::default()).is_err());

        let mut settings = OssSettings::default();
        settings.access_key_id = Some("id".into());
        settings.access_key_secret = Some("secret".into());
        settings.bucket = Some("my-bucket".into());
        settings.region = Some("oss-cn-shanghai".into());
        let client = OssClient::new(&settings).unwrap();
        assert_eq!(client.endpoint(), "https://my-bucket.oss-cn-shanghai.aliyuncs.com");
    }
}
