// Page storage on top of `PageDb`, exposed to the engine as a content
// provider and to the batch driver as a page catalog.
//
// Titles are stored in key form (underscores for spaces), one row per
// (namespace, title). Every write appends a revision.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use linktitles_core::batch::{EditOptions, PageCatalog};
use linktitles_core::provider::{blacklist_key, ContentProvider, CorpusQuery, CorpusRow};
use linktitles_core::title::{NamespaceId, PageTitle};
use linktitles_core::ProviderError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::db::PageDb;

/// Edit summary used when pages are written directly (imports, `put_page`).
pub const IMPORT_SUMMARY: &str = "Imported page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub page_id: i64,
    pub title: PageTitle,
    pub text: String,
    pub touched: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub rev_id: i64,
    pub text: String,
    pub summary: String,
    pub minor: bool,
    pub bot: bool,
    pub timestamp: String,
}

#[derive(Debug)]
pub struct PageStore {
    db: PageDb,
    /// Namespace display names, loaded when the store opens.
    namespaces: BTreeMap<NamespaceId, String>,
}

impl PageStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_db(PageDb::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_db(PageDb::open_in_memory()?)
    }

    fn from_db(db: PageDb) -> Result<Self> {
        let namespaces = load_namespaces(db.connection())?;
        Ok(Self { db, namespaces })
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    pub fn schema_version(&self) -> Result<i64> {
        self.db.schema_version()
    }

    /// Known namespaces, by id.
    pub fn namespaces(&self) -> &BTreeMap<NamespaceId, String> {
        &self.namespaces
    }

    /// Register or rename a namespace.
    pub fn put_namespace(&mut self, namespace: NamespaceId, name: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO namespaces (ns_id, ns_name) VALUES (?1, ?2)
                 ON CONFLICT (ns_id) DO UPDATE SET ns_name = excluded.ns_name",
                params![namespace, name],
            )
            .with_context(|| format!("failed to store namespace {namespace}"))?;
        self.namespaces.insert(namespace, name.to_owned());
        Ok(())
    }

    /// Parse `Ns:Title` against the stored namespace names.
    pub fn parse_title(&self, raw: &str) -> Result<PageTitle> {
        PageTitle::parse_prefixed(raw, |prefix| self.lookup_namespace(prefix))
            .with_context(|| format!("invalid page title `{raw}`"))
    }

    /// Create or replace a page, recording a revision. Returns the page id.
    pub fn put_page(&self, title: &PageTitle, text: &str) -> Result<i64> {
        let edit = EditOptions { summary: IMPORT_SUMMARY.to_owned(), minor: false, bot: false };
        self.write_page(title, text, &edit)
    }

    pub fn page(&self, title: &PageTitle) -> Result<Option<StoredPage>> {
        self.conn()
            .query_row(
                "SELECT page_id, page_text, page_touched FROM pages
                 WHERE page_namespace = ?1 AND page_title = ?2",
                params![title.namespace(), title.db_key()],
                |row| {
                    Ok(StoredPage {
                        page_id: row.get(0)?,
                        title: title.clone(),
                        text: row.get(1)?,
                        touched: row.get(2)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to load page `{title}`"))
    }

    /// Revisions of a page, oldest first.
    pub fn revisions(&self, title: &PageTitle) -> Result<Vec<Revision>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT r.rev_id, r.rev_text, r.rev_summary, r.rev_minor, r.rev_bot, r.rev_timestamp
                 FROM revisions r JOIN pages p ON p.page_id = r.page_id
                 WHERE p.page_namespace = ?1 AND p.page_title = ?2
                 ORDER BY r.rev_id",
            )
            .context("failed to prepare revision query")?;
        let rows = stmt
            .query_map(params![title.namespace(), title.db_key()], |row| {
                Ok(Revision {
                    rev_id: row.get(0)?,
                    text: row.get(1)?,
                    summary: row.get(2)?,
                    minor: row.get(3)?,
                    bot: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })
            .context("failed to query revisions")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("failed to read revisions of `{title}`"))
    }

    /// Number of stored pages in `namespaces`.
    pub fn page_count(&self, namespaces: &[NamespaceId]) -> Result<usize> {
        if namespaces.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "SELECT COUNT(*) FROM pages WHERE page_namespace IN ({})",
            placeholders(namespaces.len())
        );
        let count: i64 = self
            .conn()
            .query_row(&sql, params_from_iter(namespaces.iter()), |row| row.get(0))
            .context("failed to count pages")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Pages in `namespaces` from `offset` on, in insertion order.
    pub fn page_titles(&self, namespaces: &[NamespaceId], offset: usize) -> Result<Vec<PageTitle>> {
        if namespaces.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT page_namespace, page_title FROM pages
             WHERE page_namespace IN ({})
             ORDER BY page_id
             LIMIT -1 OFFSET ?",
            placeholders(namespaces.len())
        );
        let mut values: Vec<Value> = namespaces.iter().map(|ns| Value::from(*ns)).collect();
        values.push(Value::from(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = self.conn().prepare(&sql).context("failed to prepare page listing")?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row.get::<_, NamespaceId>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to list pages")?;

        let mut titles = Vec::new();
        for row in rows {
            let (namespace, key) = row.context("failed to read page row")?;
            match PageTitle::new(namespace, &key) {
                Ok(title) => titles.push(title),
                Err(error) => warn!(namespace, title = %key, %error, "skipping page with invalid title"),
            }
        }
        Ok(titles)
    }

    fn write_page(&self, title: &PageTitle, text: &str, edit: &EditOptions) -> Result<i64> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let tx = self
            .conn()
            .unchecked_transaction()
            .context("failed to start page write transaction")?;

        tx.execute(
            "INSERT INTO pages (page_namespace, page_title, page_text, page_touched)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (page_namespace, page_title)
             DO UPDATE SET page_text = excluded.page_text, page_touched = excluded.page_touched",
            params![title.namespace(), title.db_key(), text, now],
        )
        .with_context(|| format!("failed to write page `{title}`"))?;

        let page_id: i64 = tx
            .query_row(
                "SELECT page_id FROM pages WHERE page_namespace = ?1 AND page_title = ?2",
                params![title.namespace(), title.db_key()],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to read id of page `{title}`"))?;

        tx.execute(
            "INSERT INTO revisions (page_id, rev_text, rev_summary, rev_minor, rev_bot, rev_timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![page_id, text, edit.summary, edit.minor, edit.bot, now],
        )
        .with_context(|| format!("failed to record revision of `{title}`"))?;

        tx.commit().with_context(|| format!("failed to commit page `{title}`"))?;
        debug!(page = %title, page_id, minor = edit.minor, "page written");
        Ok(page_id)
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<NamespaceId> {
        let wanted = prefix.trim().replace('_', " ");
        self.namespaces
            .iter()
            .find(|(_, name)| !name.is_empty() && name.eq_ignore_ascii_case(&wanted))
            .map(|(id, _)| *id)
    }

    fn corpus_rows(&self, query: &CorpusQuery<'_>) -> Result<Vec<CorpusRow>> {
        if query.namespaces.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT page_namespace, page_title FROM pages
             WHERE page_namespace IN ({})
             AND length(page_title) >= ?",
            placeholders(query.namespaces.len())
        );
        let mut values: Vec<Value> = query.namespaces.iter().map(|ns| Value::from(*ns)).collect();
        values.push(Value::from(i64::try_from(query.minimum_length).unwrap_or(i64::MAX)));

        if !query.black_list.is_empty() {
            sql.push_str(&format!(" AND page_title NOT IN ({})", placeholders(query.black_list.len())));
            values.extend(
                query.black_list.iter().map(|title| Value::from(blacklist_key(title).replace(' ', "_"))),
            );
        }
        sql.push_str(" ORDER BY page_id");

        let mut stmt = self.conn().prepare(&sql).context("failed to prepare corpus query")?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(CorpusRow::new(row.get::<_, NamespaceId>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to query corpus")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().context("failed to read corpus rows")
    }
}

impl ContentProvider for PageStore {
    fn page_text(&self, title: &PageTitle) -> Result<Option<String>, ProviderError> {
        self.page(title)
            .map(|page| page.map(|page| page.text))
            .map_err(ProviderError::backend)
    }

    fn corpus(&self, query: &CorpusQuery<'_>) -> Result<Vec<CorpusRow>, ProviderError> {
        self.corpus_rows(query).map_err(ProviderError::backend)
    }

    fn namespace_name(&self, namespace: NamespaceId) -> Option<String> {
        self.namespaces.get(&namespace).filter(|name| !name.is_empty()).cloned()
    }

    fn namespace_id(&self, name: &str) -> Option<NamespaceId> {
        self.lookup_namespace(name)
    }
}

impl PageCatalog for PageStore {
    fn count_pages(&self, namespaces: &[NamespaceId]) -> Result<usize, ProviderError> {
        self.page_count(namespaces).map_err(ProviderError::backend)
    }

    fn list_pages(
        &self,
        namespaces: &[NamespaceId],
        offset: usize,
    ) -> Result<Vec<PageTitle>, ProviderError> {
        self.page_titles(namespaces, offset).map_err(ProviderError::backend)
    }

    fn save_page(
        &self,
        title: &PageTitle,
        text: &str,
        edit: &EditOptions,
    ) -> Result<(), ProviderError> {
        if self.page(title).map_err(ProviderError::backend)?.is_none() {
            return Err(ProviderError::NotFound(title.to_string()));
        }
        self.write_page(title, text, edit).map(|_| ()).map_err(ProviderError::backend)
    }
}

fn load_namespaces(conn: &Connection) -> Result<BTreeMap<NamespaceId, String>> {
    let mut stmt = conn
        .prepare("SELECT ns_id, ns_name FROM namespaces ORDER BY ns_id")
        .context("failed to prepare namespace query")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, NamespaceId>(0)?, row.get::<_, String>(1)?)))
        .context("failed to query namespaces")?;
    rows.collect::<rusqlite::Result<BTreeMap<_, _>>>().context("failed to read namespaces")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
