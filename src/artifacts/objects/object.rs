use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Cursor, Write};

/// Failure to decode an object body
///
/// The object store turns this into a `CorruptObject` error carrying the object id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, new)]
#[error("{0}")]
pub struct MalformedObject(String);

impl From<std::io::Error> for MalformedObject {
    fn from(error: std::io::Error) -> Self {
        MalformedObject(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for MalformedObject {
    fn from(error: std::string::FromUtf8Error) -> Self {
        MalformedObject(error.to_string())
    }
}

/// Encode an object body (without the `<kind> <size>\0` header)
pub trait Packable {
    fn serialize(&self) -> Bytes;
}

/// Decode an object body (without the header)
///
/// Ids embedded in trees are binary, so decoding needs the repository's algorithm.
pub trait Unpackable {
    fn deserialize(reader: impl BufRead, algorithm: HashAlgorithm) -> Result<Self, MalformedObject>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Canonical encoding `<kind> <size>\0<body>` that gets hashed and stored
    fn encode(&self) -> Bytes {
        encode(self.object_type(), &self.serialize())
    }

    fn object_id(&self, algorithm: HashAlgorithm) -> ObjectId {
        algorithm.digest(&self.encode())
    }
}

/// Prefix a body with its `<kind> <size>\0` header
pub fn encode(object_type: ObjectType, body: &[u8]) -> Bytes {
    let mut object_bytes = Vec::with_capacity(body.len() + 32);
    // writing into a Vec cannot fail
    let _ = write!(object_bytes, "{} {}\0", object_type.as_str(), body.len());
    object_bytes.extend_from_slice(body);

    Bytes::from(object_bytes)
}

/// Split a canonical encoding into its kind and body, checking the declared size
pub fn decode(raw: &Bytes) -> Result<(ObjectType, Bytes), MalformedObject> {
    let mut reader = Cursor::new(raw.as_ref());

    let mut object_type = Vec::new();
    reader.read_until(b' ', &mut object_type)?;
    if object_type.pop() != Some(b' ') {
        return Err(MalformedObject::new("missing object type".into()));
    }
    let object_type = ObjectType::try_from(std::str::from_utf8(&object_type).unwrap_or(""))?;

    let mut size = Vec::new();
    reader.read_until(b'\0', &mut size)?;
    if size.pop() != Some(b'\0') {
        return Err(MalformedObject::new("missing object size".into()));
    }
    let size = std::str::from_utf8(&size)
        .ok()
        .and_then(|size| size.parse::<usize>().ok())
        .ok_or_else(|| MalformedObject::new("invalid object size".into()))?;

    let body = raw.slice(reader.position() as usize..);
    if body.len() != size {
        return Err(MalformedObject::new(format!(
            "declared size {size} but body has {} bytes",
            body.len()
        )));
    }

    Ok((object_type, body))
}

/// Any object read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBox {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl ObjectBox {
    pub fn parse(
        object_type: ObjectType,
        body: Bytes,
        algorithm: HashAlgorithm,
    ) -> Result<Self, MalformedObject> {
        let reader = Cursor::new(body);

        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Blob::deserialize(reader, algorithm)?),
            ObjectType::Tree => ObjectBox::Tree(Tree::deserialize(reader, algorithm)?),
            ObjectType::Commit => ObjectBox::Commit(Commit::deserialize(reader, algorithm)?),
            ObjectType::Tag => ObjectBox::Tag(Tag::deserialize(reader, algorithm)?),
        })
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
            ObjectBox::Tag(_) => ObjectType::Tag,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
            ObjectBox::Tag(tag) => tag.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_then_decode_recovers_kind_and_body() {
        let raw = encode(ObjectType::Blob, b"hello\n");

        assert_eq!(raw.as_ref(), b"blob 6\0hello\n");
        let (object_type, body) = decode(&raw).unwrap();
        assert_eq!(object_type, ObjectType::Blob);
        assert_eq!(body.as_ref(), b"hello\n");
    }

    #[test]
    fn decode_rejects_size_mismatch() {
        let raw = Bytes::from_static(b"blob 7\0hello\n");

        assert!(decode(&raw).is_err());
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        let raw = Bytes::from_static(b"bolb 6\0hello\n");

        assert!(decode(&raw).is_err());
    }
}
