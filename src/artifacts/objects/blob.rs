//! Blob object
//!
//! Blobs store file content. They contain only the raw bytes, without any
//! metadata like filename or permissions (those live in trees and the index).
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::{MalformedObject, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::HashAlgorithm;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::io::BufRead;

/// Number of leading bytes inspected by [`Blob::is_binary`]
const BINARY_PROBE_SIZE: usize = 8000;

/// Opaque byte content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Blob {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Size of the content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Heuristic used for display decisions: a NUL byte near the start means binary
    pub fn is_binary(&self) -> bool {
        self.content
            .iter()
            .take(BINARY_PROBE_SIZE)
            .any(|byte| *byte == 0)
    }
}

impl Packable for Blob {
    fn serialize(&self) -> Bytes {
        self.content.clone()
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead, _: HashAlgorithm) -> Result<Self, MalformedObject> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(content))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
