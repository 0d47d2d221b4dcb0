//! Corp-code directory: company name to OpenDART identifier.
//!
//! The catalog is a ZIP archive holding a single `CORPCODE.xml` document.
//! It is downloaded once, parsed into an immutable snapshot and published
//! with a single swap; readers before the swap see the directory as
//! unloaded.

use crate::dart::client::DartClient;
use crate::error::{DataError, Result};
use crate::model::{Company, CorpCode};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use zip::ZipArchive;

/// Default cap for [`CorpDirectory::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

const CATALOG_ENTRY: &str = "CORPCODE.XML";

#[derive(Debug, Default)]
struct Catalog {
    by_name: HashMap<String, CorpCode>,
    companies: Vec<Company>,
}

impl Catalog {
    fn from_companies(companies: Vec<Company>) -> Self {
        let mut by_name = HashMap::with_capacity(companies.len());
        for company in &companies {
            // Later duplicates overwrite earlier ones
            by_name.insert(company.corp_name.clone(), company.corp_code.clone());
        }
        Self { by_name, companies }
    }
}

#[derive(Debug)]
enum Snapshot {
    Unloaded,
    Loaded(Catalog),
}

/// In-memory company directory.
#[derive(Debug)]
pub struct CorpDirectory {
    state: RwLock<Arc<Snapshot>>,
}

impl Default for CorpDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpDirectory {
    /// Create an unloaded directory.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(Snapshot::Unloaded)),
        }
    }

    /// Create a directory that is already loaded with `companies`.
    pub fn from_companies(companies: Vec<Company>) -> Self {
        let directory = Self::new();
        directory.publish(Catalog::from_companies(companies));
        directory
    }

    fn publish(&self, catalog: Catalog) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(Snapshot::Loaded(catalog));
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Download and index the catalog.
    ///
    /// Returns `false` and leaves the directory unloaded on any failure; the
    /// cause is logged.
    pub async fn load(&self, client: &DartClient) -> bool {
        match self.try_load(client).await {
            Ok(count) => {
                tracing::info!(companies = count, "corp directory loaded");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "corp directory load failed");
                false
            }
        }
    }

    /// Download and index the catalog, surfacing the failure cause.
    pub async fn try_load(&self, client: &DartClient) -> Result<usize> {
        tracing::debug!(base_url = client.base_url(), "downloading corp-code catalog");
        let bytes = client.fetch_corp_catalog().await?;
        let companies = parse_catalog_archive(&bytes)?;
        let count = companies.len();
        self.publish(Catalog::from_companies(companies));
        Ok(count)
    }

    /// Load the directory on a background task.
    pub fn spawn_load(self: &Arc<Self>, client: Arc<DartClient>) -> JoinHandle<bool> {
        let directory = Arc::clone(self);
        tokio::spawn(async move { directory.load(&client).await })
    }

    /// Whether the catalog has been published.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.snapshot(), Snapshot::Loaded(_))
    }

    /// Number of catalog entries (0 while unloaded).
    pub fn len(&self) -> usize {
        match &*self.snapshot() {
            Snapshot::Loaded(catalog) => catalog.companies.len(),
            Snapshot::Unloaded => 0,
        }
    }

    /// Whether the directory holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the identifier for an exact company name.
    ///
    /// # Errors
    /// Returns `DataError::NotReady` while the catalog is not loaded.
    pub fn resolve(&self, name: &str) -> Result<Option<CorpCode>> {
        match &*self.snapshot() {
            Snapshot::Loaded(catalog) => Ok(catalog.by_name.get(name).cloned()),
            Snapshot::Unloaded => Err(DataError::NotReady),
        }
    }

    /// Case-insensitive substring search, in catalog order.
    pub fn search(&self, term: &str, limit: usize) -> Vec<Company> {
        let term = term.trim().to_lowercase();
        if term.is_empty() || limit == 0 {
            return Vec::new();
        }

        match &*self.snapshot() {
            Snapshot::Loaded(catalog) => catalog
                .companies
                .iter()
                .filter(|c| c.corp_name.to_lowercase().contains(&term))
                .take(limit)
                .cloned()
                .collect(),
            Snapshot::Unloaded => Vec::new(),
        }
    }
}

/// Extract and parse the catalog document from the downloaded archive.
pub fn parse_catalog_archive(bytes: &[u8]) -> Result<Vec<Company>> {
    if !bytes.starts_with(b"PK") {
        return Err(DataError::Archive(
            "catalog response is not a ZIP archive".to_string(),
        ));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let entry = archive
        .file_names()
        .find(|name| name.to_uppercase() == CATALOG_ENTRY)
        .map(str::to_string)
        .ok_or_else(|| DataError::Archive(format!("{} not found in archive", CATALOG_ENTRY)))?;

    let mut raw = Vec::new();
    archive.by_name(&entry)?.read_to_end(&mut raw)?;
    let xml = String::from_utf8(raw)
        .map_err(|e| DataError::XmlParse(format!("catalog is not valid UTF-8: {}", e)))?;

    parse_catalog_xml(&xml)
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Code,
}

/// Parse `<list><corp_code/><corp_name/>...</list>` entries in document order.
///
/// Entries missing either field are skipped.
pub fn parse_catalog_xml(xml: &str) -> Result<Vec<Company>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut companies = Vec::new();
    let mut buf = Vec::new();
    let mut field: Option<Field> = None;
    let mut name: Option<String> = None;
    let mut code: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                field = match e.name().as_ref() {
                    b"list" => {
                        name = None;
                        code = None;
                        None
                    }
                    b"corp_name" => Some(Field::Name),
                    b"corp_code" => Some(Field::Code),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| DataError::XmlParse(format!("XML parse error: {}", e)))?
                        .trim()
                        .to_string();
                    match current {
                        Field::Name => name = Some(text),
                        Field::Code => code = Some(text),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"list"
                    && let (Some(corp_name), Some(corp_code)) = (name.take(), code.take())
                    && !corp_name.is_empty()
                    && !corp_code.is_empty()
                {
                    companies.push(Company {
                        corp_name,
                        corp_code: CorpCode::new(corp_code),
                    });
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DataError::XmlParse(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
    <list>
        <corp_code>00126380</corp_code>
        <corp_name>삼성전자</corp_name>
        <stock_code>005930</stock_code>
        <modify_date>20240101</modify_date>
    </list>
    <list>
        <corp_code>00164779</corp_code>
        <corp_name>SK하이닉스</corp_name>
        <stock_code>000660</stock_code>
    </list>
    <list>
        <corp_code>00999999</corp_code>
        <corp_name>삼성전자</corp_name>
    </list>
    <list>
        <corp_code>00000001</corp_code>
    </list>
</result>"#;

    fn company(name: &str, code: &str) -> Company {
        Company {
            corp_name: name.to_string(),
            corp_code: CorpCode::new(code),
        }
    }

    #[test]
    fn test_parse_catalog_xml() {
        let companies = parse_catalog_xml(SAMPLE).unwrap();
        assert_eq!(companies.len(), 3);
        assert_eq!(companies[0], company("삼성전자", "00126380"));
        assert_eq!(companies[1], company("SK하이닉스", "00164779"));
    }

    #[test]
    fn test_parse_catalog_rejects_non_zip() {
        let result = parse_catalog_archive(b"<html>error</html>");
        assert!(matches!(result, Err(DataError::Archive(_))));
    }

    #[test]
    fn test_resolve_before_load_is_not_ready() {
        let directory = CorpDirectory::new();
        assert!(!directory.is_loaded());
        assert!(matches!(directory.resolve("삼성전자"), Err(DataError::NotReady)));
        assert!(directory.search("삼성", 10).is_empty());
    }

    #[test]
    fn test_resolve_last_duplicate_wins() {
        let directory = CorpDirectory::from_companies(parse_catalog_xml(SAMPLE).unwrap());
        assert_eq!(
            directory.resolve("삼성전자").unwrap(),
            Some(CorpCode::new("00999999"))
        );
        assert_eq!(directory.resolve("없는회사").unwrap(), None);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_resolve_is_exact() {
        let directory = CorpDirectory::from_companies(parse_catalog_xml(SAMPLE).unwrap());
        assert_eq!(directory.resolve(" 삼성전자 ").unwrap(), None);
        assert_eq!(directory.resolve("삼성").unwrap(), None);
        assert_eq!(directory.resolve("sk하이닉스").unwrap(), None);
    }

    #[test]
    fn test_search_case_insensitive_and_limited() {
        let directory = CorpDirectory::from_companies(vec![
            company("SK하이닉스", "00164779"),
            company("SK텔레콤", "00159023"),
            company("삼성전자", "00126380"),
        ]);

        let hits = directory.search("  sk ", 50);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].corp_name, "SK하이닉스");

        assert_eq!(directory.search("sk", 1).len(), 1);
        assert!(directory.search("   ", 50).is_empty());
    }
}
