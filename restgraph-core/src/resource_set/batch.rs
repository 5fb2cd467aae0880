//! Batched writes.
//!
//! The service caps the number of resources per write request, so sets are split with
//! [`ResourceSet::explode`] before being stored or destroyed. Batches are sent concurrently and
//! settle independently: a failed batch is reported with the resources it carried, the others are
//! neither cancelled nor rolled back.
use super::{ResourceSet, ResourceSetError};
use crate::collection::CollectionError;
use crate::descriptor::DEFAULT_BATCH_SIZE;
use futures_util::future::join_all;

/// A failed batch write, carrying the batch that triggered it.
#[derive(Debug, thiserror::Error)]
#[error("Batch of {} resource(s) failed: {source}", .batch.len())]
pub struct BatchError {
    batch: Box<ResourceSet>,
    #[source]
    source: CollectionError,
}

impl BatchError {
    pub fn batch(&self) -> &ResourceSet {
        &self.batch
    }

    pub fn into_batch(self) -> ResourceSet {
        *self.batch
    }

    pub fn source_error(&self) -> &CollectionError {
        &self.source
    }
}

impl ResourceSet {
    /// The batch size used when none is given: the collection's limit, or the default one.
    pub fn batch_size(&self) -> usize {
        self.collection
            .as_ref()
            .map(|collection| collection.batch_size())
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Splits the set into consecutive sets of at most `size` resources (the batch size by
    /// default). The last set holds the remainder.
    pub fn explode(&self, size: Option<usize>) -> Vec<ResourceSet> {
        let size = size.filter(|size| *size > 0).unwrap_or(self.batch_size());

        self.resources
            .chunks(size)
            .map(|chunk| ResourceSet::from_resources(chunk.to_vec(), self.collection.clone()))
            .collect()
    }

    /// Stores every batch concurrently and reports each outcome in batch order.
    pub async fn save(
        &self,
        batch_size: Option<usize>,
    ) -> Result<Vec<Result<ResourceSet, BatchError>>, ResourceSetError> {
        let collection = self.collection.as_ref().ok_or(ResourceSetError::NoEndpoint)?;

        let requests = self.explode(batch_size).into_iter().map(|batch| async move {
            match collection.store_batch(&batch).await {
                Ok(stored) => Ok(stored),
                Err(source) => Err(BatchError {
                    batch: Box::new(batch),
                    source,
                }),
            }
        });

        Ok(join_all(requests).await)
    }

    /// Deletes every resource, one request per batch of refs, and reports each outcome in batch
    /// order.
    pub async fn destroy(
        &self,
    ) -> Result<Vec<Result<serde_json::Value, BatchError>>, ResourceSetError> {
        let collection = self.collection.as_ref().ok_or(ResourceSetError::NoEndpoint)?;

        let requests = self.explode(None).into_iter().map(|batch| async move {
            let refs: Vec<&str> = batch.iter().filter_map(|r| r.reference()).collect();
            match collection.destroy_refs(&refs).await {
                Ok(response) => Ok(response),
                Err(source) => Err(BatchError {
                    batch: Box::new(batch),
                    source,
                }),
            }
        });

        Ok(join_all(requests).await)
    }
}
