//! Object store
//!
//! Loose, zlib-compressed objects under `.grove/objects/<2 hex>/<rest hex>`.
//! Every object is addressed by the digest of its canonical encoding, so the
//! store is append-only and writes are idempotent.
//!
//! Reads verify integrity: the stored bytes must inflate, re-hash to the
//! requested id and carry a well-formed header and body. Anything else is
//! reported as a corrupt object.

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::core::fsutil;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{self, Object, ObjectBox};
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use bytes::Bytes;
use derive_new::new;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Summary of a stored object
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ObjectInfo {
    pub oid: ObjectId,
    pub object_type: ObjectType,
    pub size: usize,
}

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    algorithm: HashAlgorithm,
}

impl Database {
    pub fn new(path: Box<Path>, algorithm: HashAlgorithm) -> Self {
        Database { path, algorithm }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    fn check_algorithm(&self, operation: &'static str, object_id: &ObjectId) -> Result<()> {
        if object_id.algorithm() != self.algorithm {
            return Err(Error::invalid_argument(
                operation,
                object_id,
                format!("repository uses {} object ids", self.algorithm),
            ));
        }

        Ok(())
    }

    /// Id `content` would be stored under, without writing anything
    pub fn hash(&self, object_type: ObjectType, content: &[u8]) -> ObjectId {
        self.algorithm.digest(&object::encode(object_type, content))
    }

    /// Id of a file's content as a blob, without writing anything
    pub fn hash_file(&self, path: &Path) -> Result<ObjectId> {
        let content =
            std::fs::read(path).map_err(Error::io_or_not_found("hash_file", path.display()))?;

        Ok(self.hash(ObjectType::Blob, &content))
    }

    /// Store raw content of the given kind
    ///
    /// The body is validated by parsing it first, so the store never holds an
    /// object it could not read back. Storing existing content is a no-op.
    #[tracing::instrument(level = "debug", skip(self, content), fields(size = content.len()))]
    pub fn write(&self, object_type: ObjectType, content: &[u8]) -> Result<ObjectId> {
        let body = Bytes::copy_from_slice(content);
        ObjectBox::parse(object_type, body.clone(), self.algorithm)
            .map_err(|e| Error::invalid_argument("write_object", object_type, e))?;

        self.write_encoded(object::encode(object_type, &body))
    }

    /// Serialize and store a typed object
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.write_encoded(object.encode())
    }

    fn write_encoded(&self, encoded: Bytes) -> Result<ObjectId> {
        let object_id = self.algorithm.digest(&encoded);
        let object_path = self.object_path(&object_id);

        // write the object to disk unless it already exists
        if object_path.exists() {
            tracing::trace!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        let compressed = Self::compress(&encoded)
            .map_err(Error::io("write_object", object_path.display()))?;
        fsutil::write_atomically("write_object", &object_path, &compressed)?;
        tracing::debug!(oid = %object_id, "stored object");

        Ok(object_id)
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        object_id.algorithm() == self.algorithm && self.object_path(object_id).is_file()
    }

    /// Read an object's kind and body, verifying its integrity
    pub fn read_raw(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        self.check_algorithm("read_object", object_id)?;

        let object_path = self.object_path(object_id);
        let compressed = std::fs::read(&object_path)
            .map_err(Error::io_or_not_found("read_object", object_id))?;

        let encoded = Self::decompress(&compressed)
            .map_err(|e| Error::corrupt("read_object", object_id, e))?;

        let actual_id = self.algorithm.digest(&encoded);
        if actual_id != *object_id {
            return Err(Error::corrupt(
                "read_object",
                object_id,
                format!("content hashes to {actual_id}"),
            ));
        }

        object::decode(&encoded).map_err(|e| Error::corrupt("read_object", object_id, e))
    }

    pub fn read(&self, object_id: &ObjectId) -> Result<ObjectBox> {
        let (object_type, body) = self.read_raw(object_id)?;

        ObjectBox::parse(object_type, body, self.algorithm)
            .map_err(|e| Error::corrupt("read_object", object_id, e))
    }

    pub fn read_type(&self, object_id: &ObjectId) -> Result<ObjectType> {
        self.read_raw(object_id).map(|(object_type, _)| object_type)
    }

    fn wrong_type(
        operation: &'static str,
        object_id: &ObjectId,
        expected: ObjectType,
        found: ObjectType,
    ) -> Error {
        Error::invalid_argument(
            operation,
            object_id,
            format!("expected a {expected}, found a {found}"),
        )
    }

    pub fn read_blob(&self, object_id: &ObjectId) -> Result<Blob> {
        match self.read(object_id)? {
            ObjectBox::Blob(blob) => Ok(blob),
            other => Err(Self::wrong_type(
                "read_blob",
                object_id,
                ObjectType::Blob,
                other.object_type(),
            )),
        }
    }

    pub fn read_tree(&self, object_id: &ObjectId) -> Result<Tree> {
        match self.read(object_id)? {
            ObjectBox::Tree(tree) => Ok(tree),
            other => Err(Self::wrong_type(
                "read_tree",
                object_id,
                ObjectType::Tree,
                other.object_type(),
            )),
        }
    }

    pub fn read_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        match self.read(object_id)? {
            ObjectBox::Commit(commit) => Ok(commit),
            other => Err(Self::wrong_type(
                "read_commit",
                object_id,
                ObjectType::Commit,
                other.object_type(),
            )),
        }
    }

    pub fn read_tag(&self, object_id: &ObjectId) -> Result<Tag> {
        match self.read(object_id)? {
            ObjectBox::Tag(tag) => Ok(tag),
            other => Err(Self::wrong_type(
                "read_tag",
                object_id,
                ObjectType::Tag,
                other.object_type(),
            )),
        }
    }

    /// Every stored object with its kind and size, sorted by id
    pub fn list(&self) -> Result<Vec<ObjectInfo>> {
        let mut objects = self
            .find_by_prefix("")?
            .into_iter()
            .map(|oid| {
                let (object_type, body) = self.read_raw(&oid)?;
                Ok(ObjectInfo::new(oid, object_type, body.len()))
            })
            .collect::<Result<Vec<_>>>()?;
        objects.sort_by(|a, b| a.oid.cmp(&b.oid));

        Ok(objects)
    }

    /// Find all objects whose id starts with the given hex prefix
    ///
    /// An empty prefix matches every object. For prefixes of 2+ characters only
    /// the matching fan-out directory is searched.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        if prefix.len() > self.algorithm.hex_len()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(Error::invalid_argument(
                "find_objects",
                prefix,
                "expected a lowercase hexadecimal object id prefix",
            ));
        }

        let directories = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        let mut matches = Vec::new();
        for dir_name in directories {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            let entries =
                std::fs::read_dir(&dir_path).map_err(Error::io("find_objects", dir_path.display()))?;
            for entry in entries {
                let entry = entry.map_err(Error::io("find_objects", dir_path.display()))?;
                let full_oid = format!("{dir_name}{}", entry.file_name().to_string_lossy());

                // skips in-flight temp files as well
                if full_oid.starts_with(prefix)
                    && let Ok(oid) = ObjectId::try_parse(&full_oid)
                    && oid.algorithm() == self.algorithm
                {
                    matches.push(oid);
                }
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }
}
