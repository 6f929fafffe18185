//! Published AWS IP ranges.
//!
//! Downloads `ip-ranges.json` and groups its IPv4 and IPv6 prefixes by the
//! alias name derived from each prefix's region and service.

use crate::Result;
use async_trait::async_trait;
use fauxapi_core::client::ClientConfig;
use fauxapi_core::Error;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use url::Url;

/// Location of the document published by AWS.
pub const AWS_IP_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Longest alias name the appliance accepts.
pub const ALIAS_NAME_MAX_LEN: usize = 32;

const USER_AGENT: &str = concat!("fauxapi-aliases/", env!("CARGO_PKG_VERSION"));

/// The `ip-ranges.json` document, limited to the fields used here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpRangesDocument {
    /// Publication token.
    #[serde(rename = "syncToken", default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    /// Publication time, e.g. `2018-07-04-01-12-10`.
    #[serde(rename = "createDate")]
    pub create_date: String,
    /// IPv4 prefixes.
    #[serde(default)]
    pub prefixes: Vec<IpPrefix>,
    /// IPv6 prefixes.
    #[serde(default)]
    pub ipv6_prefixes: Vec<IpPrefix>,
}

/// One prefix entry from either prefix list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpPrefix {
    /// Region, e.g. `ap-southeast-1` or `GLOBAL`.
    pub region: String,
    /// Service, e.g. `EC2` or `ROUTE53_HEALTHCHECKS`.
    pub service: String,
    /// IPv4 prefix (IPv4 list only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_prefix: Option<String>,
    /// IPv6 prefix (IPv6 list only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_prefix: Option<String>,
    /// Network border group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_border_group: Option<String>,
}

/// Prefixes grouped under one derived alias name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeEntry {
    /// IPv4 prefixes in document order.
    pub ipv4: Vec<String>,
    /// IPv6 prefixes in document order.
    pub ipv6: Vec<String>,
    /// `AWS <region> <service>` of the first prefix seen for this name.
    pub description: String,
    /// `createDate` of the document.
    pub aws_create_date: String,
}

/// Lower-case `value` and strip every `separator`.
#[must_use]
pub fn normalize(value: &str, separator: char) -> String {
    value.replace(separator, "").to_lowercase()
}

/// Alias name for a region/service pair, capped at [`ALIAS_NAME_MAX_LEN`] characters.
///
/// ```
/// use fauxapi_aliases::alias_name;
/// assert_eq!(alias_name("ap-southeast-1", "EC2"), "aws_apsoutheast1_ec2");
/// ```
#[must_use]
pub fn alias_name(region: &str, service: &str) -> String {
    format!(
        "aws_{}_{}",
        normalize(region, '-'),
        normalize(service, '_')
    )
    .chars()
    .take(ALIAS_NAME_MAX_LEN)
    .collect()
}

/// Group every prefix of `document` by its derived alias name.
#[must_use]
pub fn flatten_ranges(document: &IpRangesDocument) -> BTreeMap<String, RangeEntry> {
    let mut ranges: BTreeMap<String, RangeEntry> = BTreeMap::new();

    for prefix in document.prefixes.iter().chain(&document.ipv6_prefixes) {
        let entry = ranges
            .entry(alias_name(&prefix.region, &prefix.service))
            .or_insert_with(|| RangeEntry {
                description: format!("AWS {} {}", prefix.region, prefix.service),
                aws_create_date: document.create_date.clone(),
                ..RangeEntry::default()
            });

        if let Some(ip) = prefix.ip_prefix.as_deref().filter(|p| !p.is_empty()) {
            entry.ipv4.push(ip.to_string());
        }
        if let Some(ip) = prefix.ipv6_prefix.as_deref().filter(|p| !p.is_empty()) {
            entry.ipv6.push(ip.to_string());
        }
    }

    ranges
}

/// Source of flattened ranges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch and flatten the current ranges.
    async fn fetch_ranges(&self) -> Result<BTreeMap<String, RangeEntry>>;
}

/// Downloads `ip-ranges.json` over HTTP.
#[derive(Debug, Clone)]
pub struct IpRangesFetcher {
    http: Client,
    source_url: Url,
}

impl IpRangesFetcher {
    /// Fetcher for the AWS published document.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        Self::with_source_url(AWS_IP_RANGES_URL)
    }

    /// Fetcher for an alternative location of the same document format.
    ///
    /// # Errors
    ///
    /// Returns an error if `source_url` is not a valid URL or the HTTP client
    /// cannot be constructed.
    pub fn with_source_url(source_url: impl AsRef<str>) -> Result<Self> {
        let source_url = Url::parse(source_url.as_ref())?;
        let http = ClientConfig::ip_ranges().build_http_client(USER_AGENT)?;

        Ok(Self { http, source_url })
    }

    /// The URL the document is fetched from.
    #[must_use]
    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    /// Download and parse the document.
    pub async fn fetch_document(&self) -> Result<IpRangesDocument> {
        info!(url = %self.source_url, "Fetching IP ranges");

        let response = self.http.get(self.source_url.clone()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::NOT_FOUND => {
                    Error::NotFound(format!("IP ranges at {}", self.source_url))
                }
                status if status.is_server_error() => {
                    Error::Unreachable(format!("IP ranges source error {status}: {text}"))
                }
                _ => Error::Http(format!("IP ranges source error {status}: {text}")),
            });
        }

        serde_json::from_str(&text).map_err(|err| {
            Error::Parse(format!(
                "Failed to parse IP ranges from {}: {err}",
                self.source_url
            ))
        })
    }
}

#[async_trait]
impl RangeSource for IpRangesFetcher {
    async fn fetch_ranges(&self) -> Result<BTreeMap<String, RangeEntry>> {
        let document = self.fetch_document().await?;
        let ranges = flatten_ranges(&document);
        info!(
            create_date = %document.create_date,
            ipv4 = document.prefixes.len(),
            ipv6 = document.ipv6_prefixes.len(),
            ranges = ranges.len(),
            "Flattened IP ranges"
        );
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prefix(region: &str, service: &str, ip: &str) -> IpPrefix {
        IpPrefix {
            region: region.to_string(),
            service: service.to_string(),
            ip_prefix: Some(ip.to_string()),
            ipv6_prefix: None,
            network_border_group: Some(region.to_string()),
        }
    }

    fn prefix_v6(region: &str, service: &str, ip: &str) -> IpPrefix {
        IpPrefix {
            ip_prefix: None,
            ipv6_prefix: Some(ip.to_string()),
            ..prefix(region, service, "")
        }
    }

    #[test]
    fn normalize_strips_separator_and_lowercases() {
        assert_eq!(normalize("ap-southeast-1", '-'), "apsoutheast1");
        assert_eq!(normalize("ROUTE53_HEALTHCHECKS", '_'), "route53healthchecks");
        // only the given separator is stripped
        assert_eq!(normalize("us-gov_west", '_'), "us-govwest");
    }

    #[test]
    fn alias_name_is_capped_at_32_chars() {
        assert_eq!(alias_name("us-east-1", "EC2"), "aws_useast1_ec2");

        let name = alias_name("ap-northeast-3", "ROUTE53_HEALTHCHECKS_PUBLISHING");
        assert_eq!(name.chars().count(), ALIAS_NAME_MAX_LEN);
        assert_eq!(name, "aws_apnortheast3_route53healthch");
    }

    #[test]
    fn same_name_prefixes_are_merged() {
        let document = IpRangesDocument {
            sync_token: None,
            create_date: "2020-01-01-00-00-00".to_string(),
            prefixes: vec![
                prefix("ap-southeast-1", "EC2", "13.250.0.0/15"),
                prefix("ap-southeast-1", "EC2", "18.136.0.0/16"),
                prefix("us-east-1", "EC2", "3.80.0.0/12"),
            ],
            ipv6_prefixes: vec![prefix_v6("ap-southeast-1", "EC2", "2406:da18::/36")],
        };

        let ranges = flatten_ranges(&document);
        assert_eq!(ranges.len(), 2);

        let entry = &ranges["aws_apsoutheast1_ec2"];
        assert_eq!(entry.ipv4, vec!["13.250.0.0/15", "18.136.0.0/16"]);
        assert_eq!(entry.ipv6, vec!["2406:da18::/36"]);
        assert_eq!(entry.description, "AWS ap-southeast-1 EC2");
        assert_eq!(entry.aws_create_date, "2020-01-01-00-00-00");
    }

    #[test]
    fn first_occurrence_sets_description() {
        // service separators are stripped before grouping
        let document = IpRangesDocument {
            sync_token: None,
            create_date: "d".to_string(),
            prefixes: vec![
                prefix("eu-west-1", "S3_X", "1.0.0.0/8"),
                prefix("eu-west-1", "S3X", "2.0.0.0/8"),
            ],
            ipv6_prefixes: Vec::new(),
        };

        let ranges = flatten_ranges(&document);
        assert_eq!(ranges.len(), 1);
        let entry = &ranges["aws_euwest1_s3x"];
        assert_eq!(entry.description, "AWS eu-west-1 S3_X");
        assert_eq!(entry.ipv4, vec!["1.0.0.0/8", "2.0.0.0/8"]);
    }

    #[test]
    fn empty_prefixes_are_skipped() {
        let document = IpRangesDocument {
            sync_token: None,
            create_date: "d".to_string(),
            prefixes: vec![prefix("GLOBAL", "CLOUDFRONT", "")],
            ipv6_prefixes: Vec::new(),
        };

        let ranges = flatten_ranges(&document);
        let entry = &ranges["aws_global_cloudfront"];
        assert!(entry.ipv4.is_empty());
        assert!(entry.ipv6.is_empty());
    }

    #[tokio::test]
    async fn fetcher_downloads_and_flattens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip-ranges.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "syncToken": "1530666732",
                "createDate": "2018-07-04-01-12-10",
                "prefixes": [
                    {"ip_prefix": "13.250.0.0/15", "region": "ap-southeast-1",
                     "service": "AMAZON", "network_border_group": "ap-southeast-1"}
                ],
                "ipv6_prefixes": [
                    {"ipv6_prefix": "2406:da18::/36", "region": "ap-southeast-1",
                     "service": "AMAZON", "network_border_group": "ap-southeast-1"}
                ]
            })))
            .mount(&server)
            .await;

        let fetcher =
            IpRangesFetcher::with_source_url(format!("{}/ip-ranges.json", server.uri())).unwrap();
        let ranges = fetcher.fetch_ranges().await.unwrap();
        let entry = &ranges["aws_apsoutheast1_amazon"];
        assert_eq!(entry.ipv4, vec!["13.250.0.0/15"]);
        assert_eq!(entry.ipv6, vec!["2406:da18::/36"]);
        assert_eq!(entry.aws_create_date, "2018-07-04-01-12-10");
    }

    #[tokio::test]
    async fn fetcher_rejects_malformed_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = IpRangesFetcher::with_source_url(server.uri()).unwrap();
        let err = fetcher.fetch_ranges().await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn fetcher_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let fetcher = IpRangesFetcher::with_source_url(server.uri()).unwrap();
        let err = fetcher.fetch_ranges().await.unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
    }

    #[test]
    fn invalid_source_url_is_rejected() {
        let err = IpRangesFetcher::with_source_url("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }
}
