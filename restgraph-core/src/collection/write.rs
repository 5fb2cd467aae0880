//! Remote writes. Single-resource writes answer with the stored resource, unwrapped the same way
//! as [`Collection::read_one`].
use super::{Collection, CollectionError};
use crate::query::Criteria;
use crate::resource::Resource;
use crate::resource_set::ResourceSet;
use crate::transport::RequestOptions;
use serde_json::{Map, Value};

impl Collection {
    /// Creates `resource` remotely.
    pub async fn store(&self, resource: &Resource) -> Result<Resource, CollectionError> {
        let url = self.url(None, &Criteria::default());
        let options = RequestOptions::default().with_body(self.envelope(resource));

        let response = self.transport().post(&url, &options).await?;

        self.stored(response, resource)
    }

    /// Replaces `resource` remotely.
    pub async fn update(&self, resource: &Resource) -> Result<Resource, CollectionError> {
        let reference = self.reference_of(resource)?;
        let url = self.url(Some(reference), &Criteria::default());
        let options = RequestOptions::default().with_body(self.envelope(resource));

        let response = self.transport().put(&url, &options).await?;

        self.stored(response, resource)
    }

    /// Deletes `resource` remotely.
    pub async fn destroy(&self, resource: &Resource) -> Result<Value, CollectionError> {
        let reference = self.reference_of(resource)?;
        self.destroy_refs(&[reference]).await
    }

    /// Deletes the resources with the given refs in a single request.
    pub async fn destroy_refs(&self, references: &[&str]) -> Result<Value, CollectionError> {
        let refs = references.join(",");
        let url = self.url(Some(&refs), &Criteria::default());

        Ok(self
            .transport()
            .destroy(&url, &RequestOptions::default())
            .await?)
    }

    /// Stores every resource of `batch` in a single request.
    pub async fn store_batch(&self, batch: &ResourceSet) -> Result<ResourceSet, CollectionError> {
        let url = self.url(None, &Criteria::default());

        let items = batch
            .iter()
            .map(|resource| resource.to_json_with(self.descriptor()))
            .collect();
        let mut envelope = Map::new();
        envelope.insert(self.plural_name().to_string(), Value::Array(items));
        let options = RequestOptions::default().with_body(Value::Object(envelope));

        let response = self.transport().post(&url, &options).await?;

        Ok(self.resource_set(response))
    }

    /// The wire envelope for `resource`, shaped by this collection's descriptor.
    fn envelope(&self, resource: &Resource) -> Value {
        let mut envelope = Map::new();
        envelope.insert(
            self.plural_name().to_string(),
            Value::Array(vec![resource.to_json_with(self.descriptor())]),
        );
        Value::Object(envelope)
    }

    /// Services may answer a write without echoing the resource back; the written data is then
    /// taken as stored.
    fn stored(&self, response: Value, resource: &Resource) -> Result<Resource, CollectionError> {
        match self.unwrap_one(response, resource.reference().unwrap_or_default()) {
            Err(CollectionError::NotFound(_)) => {
                Ok(self.resource(Value::Object(resource.data().clone())))
            }
            other => other,
        }
    }

    fn reference_of<'a>(&self, resource: &'a Resource) -> Result<&'a str, CollectionError> {
        resource.reference().ok_or(CollectionError::MissingRef)
    }
}
