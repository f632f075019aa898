//! Published roll records.

use std::sync::Arc;

use duelcard_domain::{ContestId, RollRecord};

use crate::infrastructure::ports::{RepoError, RollRecordRepo};

pub struct RollLog {
    repo: Arc<dyn RollRecordRepo>,
}

impl RollLog {
    pub fn new(repo: Arc<dyn RollRecordRepo>) -> Self {
        Self { repo }
    }

    pub async fn publish(&self, record: &RollRecord) -> Result<(), RepoError> {
        self.repo.publish(record).await
    }

    pub async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<RollRecord>, RepoError> {
        self.repo.list_for_contest(contest_id).await
    }
}
