//! The quote store.
//!
//! `QuoteStore` owns the in-memory quote list and mirrors it to a
//! [`KeyValueStore`] after every mutation. Writes always replace the whole
//! list. The store also keeps the last selected category filter and the time
//! of the last successful sync.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::seq::SliceRandom;

use crate::error::{QuoteError, QuoteResult};
use crate::models::{seed_quotes, Quote, QuoteId, QuoteList};
use crate::reconcile::Patch;
use crate::storage::{KeyValueStore, FILTER_KEY, LAST_SYNC_KEY, QUOTES_KEY};
use crate::validation::{validate_category, validate_filter, validate_quote_text, ALL_CATEGORIES};

/// In-memory quote list mirrored to durable storage
pub struct QuoteStore {
    kv: Box<dyn KeyValueStore>,
    quotes: QuoteList,
}

impl QuoteStore {
    /// Open the store, loading the persisted list (or seeding it)
    pub fn open(kv: Box<dyn KeyValueStore>) -> QuoteResult<Self> {
        let mut store = Self {
            kv,
            quotes: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Re-read the persisted list.
    ///
    /// A missing or unreadable entry is replaced by the seed list, which is
    /// persisted straight away. Only storage backend failures are errors.
    pub fn load(&mut self) -> QuoteResult<&[Quote]> {
        let stored = match self.kv.get(QUOTES_KEY)? {
            Some(raw) => match serde_json::from_str::<QuoteList>(&raw) {
                Ok(quotes) => Some(quotes),
                Err(e) => {
                    tracing::warn!("Stored quote list is unreadable, reseeding: {}", e);
                    None
                }
            },
            None => None,
        };

        match stored {
            Some(quotes) => self.quotes = quotes,
            None => {
                self.quotes = seed_quotes();
                tracing::debug!("No stored quotes, seeding {} defaults", self.quotes.len());
                self.save()?;
            }
        }

        Ok(&self.quotes)
    }

    /// Persist the whole list, overwriting prior state
    pub fn save(&self) -> QuoteResult<()> {
        let json = serde_json::to_string(&self.quotes)?;
        self.kv.set(QUOTES_KEY, &json)
    }

    /// Current list
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Add a quote from user input.
    ///
    /// Both fields are trimmed; an empty field is rejected and the list is
    /// left unchanged.
    pub fn add(&mut self, text: &str, category: &str) -> QuoteResult<&Quote> {
        let text = validate_quote_text(text)?;
        let category = validate_category(category)?;

        self.quotes.push(Quote::new(text, category).stamped());
        if let Err(e) = self.save() {
            self.quotes.pop();
            return Err(e);
        }

        let index = self.quotes.len() - 1;
        tracing::debug!("Added quote #{} in '{}'", index, self.quotes[index].category);
        Ok(&self.quotes[index])
    }

    /// Append records without validation or duplicate detection
    pub fn import(&mut self, quotes: QuoteList) -> QuoteResult<usize> {
        let count = quotes.len();
        let previous_len = self.quotes.len();
        self.quotes.extend(quotes);
        if let Err(e) = self.save() {
            self.quotes.truncate(previous_len);
            return Err(e);
        }
        tracing::info!("Imported {} quotes", count);
        Ok(count)
    }

    /// Apply a reconciliation patch and persist, returning changed records
    pub fn apply_patch(&mut self, patch: Patch) -> QuoteResult<usize> {
        if patch.is_empty() {
            return Ok(0);
        }
        let previous = self.quotes.clone();
        let changed = patch.apply(&mut self.quotes);
        if let Err(e) = self.save() {
            self.quotes = previous;
            return Err(e);
        }
        Ok(changed)
    }

    /// Give the local-only quote at `index` the identity the remote assigned.
    ///
    /// `text` must match the record so a stale index cannot relabel the
    /// wrong quote.
    pub fn assign_id(&mut self, index: usize, text: &str, id: QuoteId) -> QuoteResult<()> {
        let Some(quote) = self.quotes.get_mut(index) else {
            return Err(QuoteError::storage_op(format!("No quote at index {}", index)));
        };
        if quote.id.is_some() || quote.text != text {
            return Err(QuoteError::storage_op(format!(
                "Quote at index {} is not the published local quote",
                index
            )));
        }

        quote.id = Some(id);
        if let Err(e) = self.save() {
            self.quotes[index].id = None;
            return Err(e);
        }
        Ok(())
    }

    /// Pick a random quote in `filter` (`"all"` for every category)
    pub fn random_quote(&self, filter: &str) -> Option<&Quote> {
        self.filtered(filter).choose(&mut rand::thread_rng()).copied()
    }

    /// Quotes in `filter` (`"all"` for every category)
    pub fn filtered(&self, filter: &str) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|q| filter == ALL_CATEGORIES || q.category == filter)
            .collect()
    }

    /// Sorted distinct categories
    pub fn categories(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|q| q.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Last selected filter, `"all"` when none was saved
    pub fn selected_filter(&self) -> QuoteResult<String> {
        Ok(self
            .kv
            .get(FILTER_KEY)?
            .unwrap_or_else(|| ALL_CATEGORIES.to_string()))
    }

    /// Remember the selected filter
    pub fn set_selected_filter(&mut self, filter: &str) -> QuoteResult<()> {
        let filter = validate_filter(filter)?;
        self.kv.set(FILTER_KEY, &filter)
    }

    /// Time of the last successful sync
    pub fn last_sync(&self) -> QuoteResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.kv.get(LAST_SYNC_KEY)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| QuoteError::storage_op(format!("Invalid stored sync time '{}': {}", raw, e)))
    }

    /// Record the time of a successful sync
    pub fn set_last_sync(&mut self, at: DateTime<Utc>) -> QuoteResult<()> {
        self.kv
            .set(LAST_SYNC_KEY, &at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
