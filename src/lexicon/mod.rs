//! Lexical query API
//!
//! The only surface the view layer talks to. Every operation first awaits
//! the shared initialization (cache → download → worker handoff), which runs
//! at most once per `Lexicon` as a task of its own, then issues its query
//! through the bridge and shapes the rows into typed records.

pub mod queries;
mod types;

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use rand::Rng;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::bridge::{Bridge, RawResultSet, Scalar};
use crate::cache::{BlobCache, DatasetCache, NoCache};
use crate::config::LexiconConfig;
use crate::error::{LexiconError, Result};
use crate::source::{DatasetSource, FileSource, HttpSource};
use crate::tag_decoder::decode_tag;
use queries::*;

pub use types::{Record, SearchOutcome, WordDetails, WordForm};
use types::{FormCount, FormOnly, RowIdBounds};

/// Outcome of the initialization task, shared by every operation
type SharedInit = Shared<BoxFuture<'static, Result<()>>>;

pub struct Lexicon {
    bridge: Arc<Bridge>,
    source: Arc<dyn DatasetSource>,
    cache: Arc<dyn DatasetCache>,
    init: Mutex<Option<SharedInit>>,
    row_bounds: OnceCell<(i64, i64)>,
}

impl Lexicon {
    /// Spawn a worker; nothing is loaded until the first operation
    pub fn new(source: Arc<dyn DatasetSource>, cache: Arc<dyn DatasetCache>) -> Result<Self> {
        Ok(Self {
            bridge: Arc::new(Bridge::spawn()?),
            source,
            cache,
            init: Mutex::new(None),
            row_bounds: OnceCell::new(),
        })
    }

    /// Wire up the source and cache the config asks for
    pub fn from_config(config: &LexiconConfig) -> Result<Self> {
        let source: Arc<dyn DatasetSource> = match &config.dataset_file {
            Some(path) => Arc::new(FileSource::new(path)),
            None => Arc::new(HttpSource::from_config(config)),
        };

        let cache: Arc<dyn DatasetCache> = if !config.cache_enabled {
            Arc::new(NoCache)
        } else if let Some(dir) = &config.cache_dir {
            Arc::new(BlobCache::new(dir))
        } else {
            match BlobCache::default_location() {
                Some(cache) => Arc::new(cache),
                None => {
                    warn!("[Lexicon] No cache directory available, caching disabled");
                    Arc::new(NoCache)
                }
            }
        };

        Self::new(source, cache)
    }

    /// Whether the dataset has reached the worker
    pub fn is_initialized(&self) -> bool {
        let init = self.init.lock().unwrap();
        matches!(init.as_ref().and_then(|outcome| outcome.peek()), Some(Ok(())))
    }

    /// Load the dataset once; every caller shares the outcome
    ///
    /// The work runs on its own task, so a caller that stops waiting does
    /// not abandon it and the next caller picks up the same result.
    pub async fn ensure_initialized(&self) -> Result<()> {
        let outcome = {
            let mut init = self.init.lock().unwrap();
            init.get_or_insert_with(|| self.start_initialization()).clone()
        };
        outcome.await
    }

    fn start_initialization(&self) -> SharedInit {
        let bridge = Arc::clone(&self.bridge);
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);

        let task = tokio::spawn(async move {
            let dataset = load_dataset(source.as_ref(), &cache).await?;
            bridge.initialize(dataset).await?;
            info!("[Lexicon] Query engine ready");
            Ok::<(), LexiconError>(())
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(LexiconError::Transport(format!(
                    "initialization task failed: {}",
                    e
                )))
            })
        }
        .boxed()
        .shared()
    }

    /// Raw escape hatch: any read query, after initialization
    pub async fn run_query(&self, sql: &str, params: Vec<Scalar>) -> Result<Option<RawResultSet>> {
        self.ensure_initialized().await?;
        self.bridge.execute(sql, params).await
    }

    async fn query<R: Record>(&self, sql: &str, params: Vec<Scalar>) -> Result<Vec<R>> {
        match self.run_query(sql, params).await? {
            Some(rows) => rows.into_records(),
            None => Ok(Vec::new()),
        }
    }

    async fn query_forms(&self, sql: &str, params: Vec<Scalar>) -> Result<Vec<String>> {
        let rows: Vec<FormOnly> = self.query(sql, params).await?;
        Ok(rows.into_iter().map(|FormOnly(form)| form).collect())
    }

    /// Number of rows in the dataset
    pub async fn total_forms(&self) -> Result<u64> {
        let rows: Vec<FormCount> = self.query(COUNT_FORMS, vec![]).await?;
        Ok(rows.first().map(|FormCount(n)| *n).unwrap_or(0))
    }

    /// Case-sensitive exact match; first row by rowid
    pub async fn word_by_form(&self, form: &str) -> Result<Option<WordForm>> {
        let rows: Vec<WordForm> = self.query(WORD_BY_FORM, vec![form.into()]).await?;
        Ok(rows.into_iter().next())
    }

    /// Exact match ignoring case
    pub async fn word_by_form_ignore_case(&self, form: &str) -> Result<Option<WordForm>> {
        let form = form.trim();
        if form.is_empty() {
            return Ok(None);
        }
        let rows: Vec<WordForm> = self
            .query(WORD_BY_FORM_NOCASE, vec![form.to_lowercase().into()])
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Forms starting with `letter`, case-insensitively
    pub async fn words_by_letter(&self, letter: &str) -> Result<Vec<WordForm>> {
        self.query(
            WORDS_MATCHING,
            vec![prefix_pattern(letter).into(), LIST_LIMIT.into()],
        )
        .await
    }

    /// Forms containing `term`, case-insensitively
    pub async fn search_forms(&self, term: &str) -> Result<Vec<WordForm>> {
        self.query(
            WORDS_MATCHING,
            vec![contains_pattern(term).into(), LIST_LIMIT.into()],
        )
        .await
    }

    /// Free-text search; an exact form match pre-empts the result list
    pub async fn search(&self, term: &str) -> Result<SearchOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(SearchOutcome::Matches(Vec::new()));
        }

        if let Some(word) = self.word_by_form(term).await? {
            return Ok(SearchOutcome::Exact(word));
        }
        Ok(SearchOutcome::Matches(self.search_forms(term).await?))
    }

    /// Rows for exactly these forms, ordered case-insensitively
    pub async fn words_by_forms(&self, forms: &[String]) -> Result<Vec<WordForm>> {
        if forms.is_empty() {
            return Ok(Vec::new());
        }

        let mut words = Vec::with_capacity(forms.len());
        for chunk in forms.chunks(BATCH_CHUNK) {
            let params = chunk.iter().map(|f| Scalar::from(f.as_str())).collect();
            let rows: Vec<WordForm> = self.query(&words_by_forms(chunk.len()), params).await?;
            words.extend(rows);
        }

        if forms.len() > BATCH_CHUNK {
            words.sort_by(|a, b| nocase_cmp(&a.form, &b.form));
        }
        Ok(words)
    }

    /// Up to eight other forms of `lemma`, randomly sampled
    pub async fn similar_forms(&self, lemma: &str, form: &str) -> Result<Vec<String>> {
        self.query_forms(
            SIMILAR_FORMS,
            vec![lemma.into(), form.into(), SIMILAR_LIMIT.into()],
        )
        .await
    }

    /// A random form
    ///
    /// Draws a rowid uniformly between the (memoized) bounds and returns the
    /// first row at or after it. Rows right after a gap in rowids are picked
    /// more often; that bias is accepted in exchange for avoiding a table
    /// shuffle.
    pub async fn random_form(&self) -> Result<Option<String>> {
        let (min_id, max_id) = self.row_bounds().await?;
        let candidate = rand::thread_rng().gen_range(min_id..=max_id);

        let forms = self.query_forms(FORM_AT_OR_AFTER, vec![candidate.into()]).await?;
        Ok(forms.into_iter().next())
    }

    async fn row_bounds(&self) -> Result<(i64, i64)> {
        self.row_bounds
            .get_or_try_init(|| async {
                let rows: Vec<RowIdBounds> = self.query(ROWID_BOUNDS, vec![]).await?;
                let bounds = rows.first().and_then(|b| b.range()).unwrap_or((1, 1));
                debug!("[Lexicon] Row id bounds {:?}", bounds);
                Ok::<_, LexiconError>(bounds)
            })
            .await
            .copied()
    }

    /// Ranked suggestions: prefix matches first, then other substring matches
    pub async fn search_suggestions(&self, term: &str, limit: usize) -> Result<Vec<String>> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let limit_param = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut suggestions = self
            .query_forms(
                SUGGEST_PREFIX,
                vec![prefix_pattern(term).into(), limit_param.into()],
            )
            .await?;

        if suggestions.len() >= limit {
            return Ok(suggestions);
        }

        let remaining = (limit - suggestions.len()) as i64;
        let contains = self
            .query_forms(
                SUGGEST_CONTAINS,
                vec![
                    contains_pattern(term).into(),
                    prefix_pattern(term).into(),
                    remaining.into(),
                ],
            )
            .await?;

        suggestions.extend(contains);
        Ok(suggestions)
    }

    /// Details view data: the form, its decoded tag and related forms
    pub async fn details(&self, form: &str) -> Result<Option<WordDetails>> {
        let Some(word) = self.word_by_form(form).await? else {
            return Ok(None);
        };

        let similar = self.similar_forms(&word.lemma, &word.form).await?;
        let description = decode_tag(word.tag.as_deref());
        Ok(Some(WordDetails {
            word,
            description,
            similar,
        }))
    }
}

/// Cached bytes if present, otherwise fetch and cache them in the background
async fn load_dataset(
    source: &dyn DatasetSource,
    cache: &Arc<dyn DatasetCache>,
) -> Result<Vec<u8>> {
    if let Some(bytes) = cache.load().await {
        info!("[Lexicon] Loaded dataset from cache ({} bytes)", bytes.len());
        return Ok(bytes);
    }

    info!(
        "[Lexicon] Dataset not cached, fetching from {}",
        source.describe()
    );
    let bytes = source.fetch().await?;

    let cache = Arc::clone(cache);
    let copy = bytes.clone();
    tokio::spawn(async move {
        match cache.save(copy).await {
            Ok(()) => debug!("[Lexicon] Dataset cached"),
            Err(e) => warn!("[Lexicon] Could not cache dataset: {}", e),
        }
    });

    Ok(bytes)
}
