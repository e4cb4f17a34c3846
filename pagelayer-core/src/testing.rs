//! Scripted backend used by the unit tests of this crate.

use async_trait::async_trait;
use bson::Document;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    backend::{DocumentCursor, FindRequest, PagingBackend},
    error::{PagingError, PagingResult},
};

/// One entry yielded by a scripted cursor.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Document(Document),
    Undecodable,
    TransportFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    Find(FindRequest),
    Count(Document),
    Aggregate(Vec<Document>, bool),
}

/// Backend replaying canned results and recording every request it receives.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    pub find_results: Vec<Scripted>,
    pub aggregate_results: Vec<Scripted>,
    pub count: i64,
    pub fail_requests: bool,
    pub fail_count: bool,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub requests: Mutex<Vec<Request>>,
}

impl ScriptedBackend {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: Request) -> PagingResult<()> {
        self.requests.lock().unwrap().push(request);

        if self.fail_requests {
            return Err(PagingError::backend("store unavailable"));
        }

        Ok(())
    }

    fn cursor(&self, items: &[Scripted]) -> Box<dyn DocumentCursor> {
        self.opened.fetch_add(1, Ordering::SeqCst);

        Box::new(ScriptedCursor {
            items: items.iter().cloned().collect(),
            current: None,
            closed: self.closed.clone(),
        })
    }
}

#[async_trait]
impl PagingBackend for ScriptedBackend {
    async fn find(
        &self,
        _collection: &str,
        request: FindRequest,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        self.record(Request::Find(request))?;

        Ok(self.cursor(&self.find_results))
    }

    async fn count_documents(&self, _collection: &str, filter: Document) -> PagingResult<i64> {
        self.record(Request::Count(filter))?;

        if self.fail_count {
            return Err(PagingError::backend("count failed"));
        }

        Ok(self.count)
    }

    async fn aggregate(
        &self,
        _collection: &str,
        stages: Vec<Document>,
        allow_disk_use: bool,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        self.record(Request::Aggregate(stages, allow_disk_use))?;

        Ok(self.cursor(&self.aggregate_results))
    }
}

struct ScriptedCursor {
    items: VecDeque<Scripted>,
    current: Option<Scripted>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl DocumentCursor for ScriptedCursor {
    async fn advance(&mut self) -> PagingResult<bool> {
        // Suspend like a network read so concurrent requests interleave.
        tokio::task::yield_now().await;

        match self.items.pop_front() {
            Some(Scripted::TransportFailure) => {
                Err(PagingError::backend("cursor interrupted"))
            }
            Some(item) => {
                self.current = Some(item);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn deserialize_current(&self) -> PagingResult<Document> {
        match &self.current {
            Some(Scripted::Document(document)) => Ok(document.clone()),
            _ => Err(PagingError::Serialization("invalid document".to_string())),
        }
    }

    async fn close(self: Box<Self>) -> PagingResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
