//! Lookup of scheme-less keys as dotted object references.

use std::collections::BTreeMap;

use super::Content;
use crate::error::GrabError;

/// Resolves a dotted reference such as `samples.iris.csv` to content.
pub trait ObjectLookup {
    fn lookup(&self, reference: &str) -> Result<Content, GrabError>;
}

/// In-memory table of named content.
#[derive(Clone, Debug, Default)]
pub struct NamedObjects {
    objects: BTreeMap<String, Content>,
}

impl NamedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, content: Content) -> Result<(), GrabError> {
        validate_reference(reference)?;
        self.objects.insert(reference.to_string(), content);
        Ok(())
    }

    pub fn with(mut self, reference: &str, content: Content) -> Result<Self, GrabError> {
        self.insert(reference, content)?;
        Ok(self)
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

impl ObjectLookup for NamedObjects {
    fn lookup(&self, reference: &str) -> Result<Content, GrabError> {
        validate_reference(reference)?;
        self.objects
            .get(reference)
            .cloned()
            .ok_or_else(|| GrabError::ObjectNotFound {
                reference: reference.to_string(),
            })
    }
}

fn validate_reference(reference: &str) -> Result<(), GrabError> {
    let valid = !reference.is_empty()
        && reference.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(GrabError::InvalidReference {
            reference: reference.to_string(),
            message: "expected dot-separated identifiers like 'package.module.name'".to_string(),
        })
    }
}
