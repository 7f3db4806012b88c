//! Shared page handle with change notification.
//!
//! A [`Page`] owns the document behind a mutex and a generation counter.
//! Content producers mutate through [`Page::update`], which bumps the
//! generation; processors use [`Page::with_document`] for their own edits so
//! they do not re-trigger themselves. Observers subscribe via
//! [`Page::subscribe`] and wait for changes to settle.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::document::{Document, NodeId};
use crate::error::DomError;

/// Default settle window for [`PageChanges::settled`] (100 ms).
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Document shared between content producers and processors.
pub struct Page {
    document: Mutex<Document>,
    generation: watch::Sender<u64>,
}

impl Page {
    /// Wrap a parsed document.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            document: Mutex::new(document),
            generation,
        }
    }

    /// Parse HTML into a new page.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        Ok(Self::new(Document::parse(html)?))
    }

    /// Run `f` with exclusive access to the document, without notifying observers.
    ///
    /// The lock is held for the duration of `f`; never await inside it.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut doc = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut doc)
    }

    /// Mutate the document and notify observers.
    pub fn update<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let result = self.with_document(f);
        self.generation.send_modify(|generation| *generation += 1);
        tracing::trace!(generation = *self.generation.borrow(), "Page updated");
        result
    }

    /// Append HTML to the page body and notify observers.
    pub fn append_html(&self, html: &str) -> Result<Vec<NodeId>, DomError> {
        self.update(|doc| {
            let body = doc.body();
            doc.append_html(body, html)
        })
    }

    /// Current change generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Subscribe to change notifications.
    ///
    /// Changes made before subscribing are not reported.
    #[must_use]
    pub fn subscribe(&self) -> PageChanges {
        PageChanges {
            rx: self.generation.subscribe(),
        }
    }

    /// Serialize the current document.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.with_document(|doc| doc.to_html())
    }

    /// Take the document out of the page.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiver side of page change notifications.
pub struct PageChanges {
    rx: watch::Receiver<u64>,
}

impl PageChanges {
    /// Wait for the next change.
    ///
    /// Returns the new generation, or `None` once the page is dropped.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Wait for a change, then until no further change arrives for `debounce`.
    ///
    /// Bursts of updates collapse into a single wake-up, like a trailing
    /// debounce timer that restarts on every change.
    pub async fn settled(&mut self, debounce: Duration) -> Option<u64> {
        let mut generation = self.changed().await?;
        loop {
            match tokio::time::timeout(debounce, self.rx.changed()).await {
                Ok(Ok(())) => generation = *self.rx.borrow_and_update(),
                // Page dropped mid-burst: still report the last batch.
                Ok(Err(_)) | Err(_) => return Some(generation),
            }
        }
    }
}
