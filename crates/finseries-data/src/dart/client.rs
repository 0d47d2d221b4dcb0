//! OpenDART API client.

use crate::error::{DataError, Result};
use crate::model::CorpCode;
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::time::Duration;

/// OpenDART API base URL
pub const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Report code for the annual business report (사업보고서)
const REPORT_CODE_ANNUAL: &str = "11011";

/// Consolidated financial statements (연결재무제표)
const FS_DIV_CONSOLIDATED: &str = "CFS";

/// Statement section marker for the balance sheet (재무상태표)
pub const SJ_DIV_BALANCE_SHEET: &str = "BS";

/// Status returned by OpenDART on success
const STATUS_OK: &str = "000";

/// Timeout for statement requests
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the corp-code catalog download
const CATALOG_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("finseries/", env!("CARGO_PKG_VERSION"));

/// One row of the `fnlttSinglAcntAll` response.
///
/// Amount fields are kept as raw text: a present-but-blank amount still
/// produces a line item (with a null amount) while an absent one does not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawStatementRow {
    /// Statement section marker (`BS`, `IS`, ...)
    #[serde(default)]
    pub sj_div: Option<String>,
    /// Account taxonomy code
    #[serde(default)]
    pub account_id: Option<String>,
    /// Account display name
    #[serde(default)]
    pub account_nm: Option<String>,
    /// Current-period amount (당기)
    #[serde(default, deserialize_with = "string_or_number")]
    pub thstrm_amount: Option<String>,
    /// Prior-period amount (전기)
    #[serde(default, deserialize_with = "string_or_number")]
    pub frmtrm_amount: Option<String>,
    /// Prior-prior-period amount (전전기)
    #[serde(default, deserialize_with = "string_or_number")]
    pub bfefrmtrm_amount: Option<String>,
}

/// Accept amounts encoded either as JSON strings or JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    list: Vec<RawStatementRow>,
}

impl StatementResponse {
    fn into_rows(self) -> Result<Vec<RawStatementRow>> {
        if self.status != STATUS_OK {
            return Err(DataError::DartApi {
                status: self.status,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(self.list)
    }
}

/// Parse a raw `fnlttSinglAcntAll` JSON body.
pub fn parse_statement_response(body: &str) -> Result<Vec<RawStatementRow>> {
    let response: StatementResponse = serde_json::from_str(body)
        .map_err(|e| DataError::Parse(format!("Failed to parse statement JSON: {}", e)))?;
    response.into_rows()
}

/// A source of raw statement windows.
///
/// Implemented by [`DartClient`]; tests substitute canned sources.
pub trait StatementSource {
    /// Fetch the balance-sheet rows of the annual report filed for `anchor_year`.
    fn fetch_window(
        &self,
        corp_code: &CorpCode,
        anchor_year: i32,
    ) -> impl Future<Output = Result<Vec<RawStatementRow>>> + Send;
}

/// OpenDART client.
pub struct DartClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DartClient {
    /// Create a client against the public OpenDART endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DART_BASE_URL)
    }

    /// Create a client against a custom base URL.
    ///
    /// # Errors
    /// Returns `DataError::MissingConfig` if the API key is blank.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(DataError::MissingConfig("DART_API_KEY is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(STATEMENT_TIMEOUT)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download the zipped corp-code catalog.
    pub async fn fetch_corp_catalog(&self) -> Result<Vec<u8>> {
        let url = format!("{}/corpCode.xml", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("crtfc_key", self.api_key.as_str())])
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::Http(format!(
                "Failed to download corp-code catalog: HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(DataError::Network)?;
        Ok(bytes.to_vec())
    }

    /// Fetch the consolidated balance sheet of the annual report for one year.
    ///
    /// # Errors
    /// Network and HTTP failures, malformed JSON, and any OpenDART status
    /// other than `000` (including `013`, "no data") are errors.
    pub async fn fetch_statement(
        &self,
        corp_code: &CorpCode,
        year: i32,
    ) -> Result<Vec<RawStatementRow>> {
        if corp_code.as_str().is_empty() {
            return Err(DataError::InvalidArgument("Empty corp code".to_string()));
        }

        let url = format!("{}/fnlttSinglAcntAll.json", self.base_url);
        let year = year.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code.as_str()),
                ("bsns_year", year.as_str()),
                ("reprt_code", REPORT_CODE_ANNUAL),
                ("fs_div", FS_DIV_CONSOLIDATED),
                ("sj_div", SJ_DIV_BALANCE_SHEET),
            ])
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::Http(format!(
                "Failed to fetch statement for {} ({}): HTTP {}",
                corp_code,
                year,
                response.status()
            )));
        }

        let body = response.text().await.map_err(DataError::Network)?;
        parse_statement_response(&body)
    }
}

impl StatementSource for DartClient {
    async fn fetch_window(
        &self,
        corp_code: &CorpCode,
        anchor_year: i32,
    ) -> Result<Vec<RawStatementRow>> {
        self.fetch_statement(corp_code, anchor_year).await
    }
}

impl std::fmt::Debug for DartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DartClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_rejected() {
        let result = DartClient::new("   ");
        assert!(matches!(result, Err(DataError::MissingConfig(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = DartClient::with_base_url("key", "http://localhost:9000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = DartClient::new("secret-key").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_parse_statement_success() {
        let body = r#"{
            "status": "000",
            "message": "정상",
            "list": [
                {
                    "sj_div": "BS",
                    "account_id": "ifrs-full_Assets",
                    "account_nm": "자산총계",
                    "thstrm_amount": "455905980000000",
                    "frmtrm_amount": "448424507000000",
                    "bfefrmtrm_amount": "426621158000000"
                },
                {
                    "sj_div": "BS",
                    "account_id": "ifrs-full_Equity",
                    "account_nm": "자본총계",
                    "thstrm_amount": 363677865000000
                }
            ]
        }"#;

        let rows = parse_statement_response(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_nm.as_deref(), Some("자산총계"));
        assert_eq!(rows[0].bfefrmtrm_amount.as_deref(), Some("426621158000000"));
        assert_eq!(rows[1].thstrm_amount.as_deref(), Some("363677865000000"));
        assert_eq!(rows[1].frmtrm_amount, None);
    }

    #[test]
    fn test_parse_statement_api_error() {
        let body = r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#;
        let result = parse_statement_response(body);
        assert!(matches!(
            result,
            Err(DataError::DartApi { ref status, .. }) if status == "013"
        ));
    }

    #[test]
    fn test_parse_statement_malformed() {
        let result = parse_statement_response("<html>maintenance</html>");
        assert!(matches!(result, Err(DataError::Parse(_))));
    }
}
