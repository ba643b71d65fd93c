//! URL composition
//!
//! Public URLs are assembled from configuration alone. Signed URLs come from
//! the backend and only have their authority swapped for the custom domain:
//! the signature covers path and query, so those are kept byte for byte.

use jiff::Timestamp;
use url::Url;

use crate::error::{Error, Result};

/// How long a temporary URL stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Valid for this many seconds from now
    Seconds(u64),
    /// Valid until this instant
    At(Timestamp),
}

impl Expiration {
    /// Validity in seconds as of `now`; `None` once the instant has passed
    pub fn ttl_secs(&self, now: Timestamp) -> Option<u64> {
        match self {
            Expiration::Seconds(secs) => Some(*secs),
            Expiration::At(at) => {
                let delta = at.as_second() - now.as_second();
                u64::try_from(delta).ok().filter(|secs| *secs > 0)
            }
        }
    }
}

/// Scheme and authority split out of a configured base
#[derive(Debug, Clone, PartialEq, Eq)]
struct Authority {
    scheme: String,
    host: String,
}

fn parse_authority(base: &str, default_scheme: &str) -> Result<Authority> {
    if base.contains("//") {
        let url = Url::parse(base)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("'{base}' has no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Authority {
            scheme: url.scheme().to_string(),
            host,
        })
    } else {
        let host = base.trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::Config("empty host".into()));
        }
        Ok(Authority {
            scheme: default_scheme.to_string(),
            host: host.to_string(),
        })
    }
}

/// Compose the public URL of `key`.
///
/// A custom domain is used verbatim. Otherwise the endpoint host is used with
/// the bucket name prepended unless it is already the leading label.
pub fn public_url(
    endpoint: Option<&str>,
    cname: Option<&str>,
    bucket: &str,
    key: &str,
) -> Result<String> {
    let cname = cname.filter(|c| !c.is_empty());
    let base = match (cname, endpoint) {
        (Some(cname), _) => cname,
        (None, Some(endpoint)) if !endpoint.is_empty() => endpoint,
        _ => return Err(Error::Config("no endpoint or custom domain configured".into())),
    };

    let mut authority = parse_authority(base, "http")?;
    if cname.is_none() && authority.host.split('.').next() != Some(bucket) {
        authority.host = format!("{bucket}.{}", authority.host);
    }

    Ok(format!("{}://{}/{key}", authority.scheme, authority.host))
}

/// Replace the scheme and host of a signed URL with the custom domain
pub fn rewrite_authority(signed: &str, cname: &str) -> Result<String> {
    let url = Url::parse(signed)?;
    let authority = parse_authority(cname, url.scheme())?;

    let mut rewritten = format!("{}://{}{}", authority.scheme, authority.host, url.path());
    if let Some(query) = url.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_prepends_bucket() {
        let url = public_url(Some("oss-cn.example.com"), None, "mybucket", "img/a.png").unwrap();
        assert_eq!(url, "http://mybucket.oss-cn.example.com/img/a.png");
    }

    #[test]
    fn test_public_url_custom_domain() {
        let url = public_url(
            Some("oss-cn.example.com"),
            Some("cdn.example.com"),
            "mybucket",
            "img/a.png",
        )
        .unwrap();
        assert_eq!(url, "http://cdn.example.com/img/a.png");
    }

    #[test]
    fn test_public_url_keeps_endpoint_scheme() {
        let url = public_url(
            Some("https://oss-cn-hangzhou.aliyuncs.com"),
            None,
            "mybucket",
            "a.txt",
        )
        .unwrap();
        assert_eq!(url, "https://mybucket.oss-cn-hangzhou.aliyuncs.com/a.txt");

        let url = public_url(Some("https://cdn.example.com"), Some("https://cdn.example.com"), "b", "a.txt")
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/a.txt");
    }

    #[test]
    fn test_public_url_bucket_already_in_host() {
        let url = public_url(
            Some("mybucket.oss-cn.example.com"),
            None,
            "mybucket",
            "a.txt",
        )
        .unwrap();
        assert_eq!(url, "http://mybucket.oss-cn.example.com/a.txt");
    }

    #[test]
    fn test_public_url_without_base() {
        assert!(public_url(None, None, "b", "a.txt").is_err());
        assert!(public_url(Some(""), Some(""), "b", "a.txt").is_err());
    }

    #[test]
    fn test_rewrite_authority_keeps_signature() {
        let signed = "https://mybucket.oss-cn.example.com/img/a.png?Expires=1700000000&OSSAccessKeyId=id&Signature=abc%2Bdef%3D";
        let url = rewrite_authority(signed, "cdn.example.com").unwrap();
        assert_eq!(
            url,
            "https://cdn.example.com/img/a.png?Expires=1700000000&OSSAccessKeyId=id&Signature=abc%2Bdef%3D"
        );

        let url = rewrite_authority(signed, "http://cdn.example.com").unwrap();
        assert!(url.starts_with("http://cdn.example.com/img/a.png?Expires="));
    }

    #[test]
    fn test_expiration_ttl() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        assert_eq!(Expiration::Seconds(60).ttl_secs(now), Some(60));

        let later = Timestamp::from_second(1_700_000_600).unwrap();
        assert_eq!(Expiration::At(later).ttl_secs(now), Some(600));

        let earlier = Timestamp::from_second(1_699_999_000).unwrap();
        assert_eq!(Expiration::At(earlier).ttl_secs(now), None);
        assert_eq!(Expiration::At(now).ttl_secs(now), None);
    }
}
