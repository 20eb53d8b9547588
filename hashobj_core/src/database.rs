//! The object database seam used by the ingestion loop.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectType;
use std::io::Read;

/// Something that can turn content into an object id and optionally keep it.
pub trait ObjectDatabase {
    /// Read all of `reader`, compute its id as an object of `object_type`,
    /// and persist it when `write` is set.
    ///
    /// `path` is the virtual path the content is associated with, if any.
    fn index(
        &self,
        reader: &mut dyn Read,
        object_type: ObjectType,
        write: bool,
        path: Option<&str>,
    ) -> Result<Hash>;
}

/// Computes ids without any backing store.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashOnly;

impl ObjectDatabase for HashOnly {
    fn index(
        &self,
        reader: &mut dyn Read,
        object_type: ObjectType,
        write: bool,
        _path: Option<&str>,
    ) -> Result<Hash> {
        if write {
            return Err(Error::NoStore);
        }

        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        Ok(Hash::of_object(object_type, &content))
    }
}
