//! # Relationship linking
//!
//! Linking writes foreign keys according to the relationship's kind:
//!
//! * **direct**: this resource stores the target's ref. Fields ending in the plural suffix hold
//!   a list of refs, appended without duplicates; other fields are overwritten.
//! * **indirect**: the target stores this resource's ref, using the field found through the
//!   target's own descriptor. The target is queued so that [`Resource::save`] persists it.
use super::{Resource, ResourceError};
use crate::descriptor::{Relationship, RelationshipError, RelationshipKind, is_plural_field};
use crate::resource_set::ResourceSet;
use serde_json::Value;

/// The resources to link: one, or a batch.
#[derive(Debug)]
pub enum LinkTarget<'a> {
    One(&'a mut Resource),
    Many(&'a mut [Resource]),
}

impl<'a> From<&'a mut Resource> for LinkTarget<'a> {
    fn from(resource: &'a mut Resource) -> Self {
        LinkTarget::One(resource)
    }
}

impl<'a> From<&'a mut [Resource]> for LinkTarget<'a> {
    fn from(resources: &'a mut [Resource]) -> Self {
        LinkTarget::Many(resources)
    }
}

impl<'a> From<&'a mut Vec<Resource>> for LinkTarget<'a> {
    fn from(resources: &'a mut Vec<Resource>) -> Self {
        LinkTarget::Many(resources.as_mut_slice())
    }
}

impl<'a> From<&'a mut ResourceSet> for LinkTarget<'a> {
    fn from(set: &'a mut ResourceSet) -> Self {
        LinkTarget::Many(set.resources_mut())
    }
}

/// Where a link ended up being written.
struct Written {
    field: String,
    plural: bool,
}

impl Resource {
    /// Links `target` to this resource.
    ///
    /// The relationship is looked up by name when `relationship` is given, and inferred from the
    /// target's resource type otherwise.
    ///
    /// Linking several resources through a single-ref field leaves only the last one linked.
    pub fn link<'a>(
        &mut self,
        target: impl Into<LinkTarget<'a>>,
        relationship: Option<&str>,
    ) -> Result<(), ResourceError> {
        match target.into() {
            LinkTarget::One(resource) => self.link_one(resource, relationship).map(|_| ()),
            LinkTarget::Many(resources) => {
                let count = resources.len();
                let mut last = None;
                for resource in resources.iter_mut() {
                    last = Some(self.link_one(resource, relationship)?);
                }
                if let Some(written) = last
                    && count > 1
                    && !written.plural
                {
                    tracing::warn!(
                        field = %written.field,
                        count,
                        "linked several resources through a single-ref field, only the last one is kept"
                    );
                }
                Ok(())
            }
        }
    }

    fn link_one(
        &mut self,
        target: &mut Resource,
        relationship: Option<&str>,
    ) -> Result<Written, ResourceError> {
        let collection = self.collection.clone().ok_or(ResourceError::NoEndpoint)?;
        let descriptor = collection.descriptor();

        let (name, rel): (&str, &Relationship) = match relationship {
            Some(name) => (name, descriptor.relationship(name)?),
            None => {
                let resource_type = target
                    .resource_type()
                    .ok_or(RelationshipError::UnknownTargetType)?;
                descriptor.relationship_for(resource_type)?
            }
        };

        match rel.kind {
            RelationshipKind::Direct => {
                let field = rel.field_path(name)?;
                let target_ref = target.reference().ok_or(ResourceError::MissingRef)?;
                Ok(write_foreign_key(self, field, target_ref))
            }
            RelationshipKind::Indirect => {
                let own_ref = self
                    .reference()
                    .ok_or(ResourceError::MissingRef)?
                    .to_string();

                let field = match target.collection() {
                    Some(target_collection) => target_collection
                        .relationship_for(&descriptor.plural_name)
                        .and_then(|(back_name, back)| back.field_path(back_name))?
                        .to_string(),
                    None => rel.field_path(name)?.to_string(),
                };

                let written = write_foreign_key(target, &field, &own_ref);
                self.indirectly_linked.push(target.clone());
                Ok(written)
            }
        }
    }
}

fn write_foreign_key(resource: &mut Resource, field: &str, reference: &str) -> Written {
    let plural = is_plural_field(field);

    if plural {
        let entry = resource
            .data
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(refs) = entry
            && !refs.iter().any(|r| r.as_str() == Some(reference))
        {
            refs.push(Value::String(reference.to_string()));
        }
    } else {
        resource
            .data
            .insert(field.to_string(), Value::String(reference.to_string()));
    }

    Written {
        field: field.to_string(),
        plural,
    }
}
