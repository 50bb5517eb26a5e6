//! Object identifier (content digest)
//!
//! Object IDs are fixed-length binary digests: 20 bytes for SHA-1 repositories and
//! 32 bytes for SHA-256 ones. Their canonical text form is lowercase hex
//! (40 or 64 characters). They uniquely identify every object in the store.
//!
//! ## Storage
//!
//! Objects are stored in `.grove/objects/<first-2-chars>/<remaining-chars>`

use crate::artifacts::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Length of an abbreviated object id
pub const SHORT_OID_LENGTH: usize = 7;

/// Digest used to address objects in a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Digest size in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Digest size in hex characters
    pub fn hex_len(&self) -> usize {
        self.byte_len() * 2
    }

    pub fn digest(&self, data: &[u8]) -> ObjectId {
        match self {
            HashAlgorithm::Sha1 => ObjectId::Sha1(Sha1::digest(data).into()),
            HashAlgorithm::Sha256 => ObjectId::Sha256(Sha256::digest(data).into()),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            _ => Err(Error::invalid_argument(
                "hash_algorithm",
                value,
                "expected 'sha1' or 'sha256'",
            )),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content digest identifying an object
///
/// Equality is byte-exact. Ids from different algorithms never compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl ObjectId {
    /// Parse and validate an object ID from its lowercase hex form
    ///
    /// # Arguments
    ///
    /// * `id` - 40 (SHA-1) or 64 (SHA-256) lowercase hexadecimal characters
    pub fn try_parse(id: &str) -> Result<Self> {
        if !id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
            return Err(Error::invalid_argument(
                "parse_object_id",
                id,
                "expected lowercase hexadecimal characters",
            ));
        }

        let bytes = hex::decode(id)
            .map_err(|e| Error::invalid_argument("parse_object_id", id, e))?;

        Self::from_bytes(&bytes)
    }

    /// Build an id from its raw digest bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if let Ok(digest) = <[u8; 20]>::try_from(bytes) {
            return Ok(ObjectId::Sha1(digest));
        }
        if let Ok(digest) = <[u8; 32]>::try_from(bytes) {
            return Ok(ObjectId::Sha256(digest));
        }

        Err(Error::invalid_argument(
            "object_id_from_bytes",
            hex::encode(bytes),
            format!("invalid object ID length: {} bytes", bytes.len()),
        ))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ObjectId::Sha1(digest) => digest,
            ObjectId::Sha256(digest) => digest,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            ObjectId::Sha1(_) => HashAlgorithm::Sha1,
            ObjectId::Sha256(_) => HashAlgorithm::Sha256,
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Write the id in binary form
    ///
    /// Used when serializing tree entries and index entries.
    pub fn write_to<W: io::Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }

    /// Read a binary id of the given algorithm's length
    pub fn read_from<R: io::Read + ?Sized>(
        reader: &mut R,
        algorithm: HashAlgorithm,
    ) -> io::Result<Self> {
        match algorithm {
            HashAlgorithm::Sha1 => {
                let mut digest = [0u8; 20];
                reader.read_exact(&mut digest)?;
                Ok(ObjectId::Sha1(digest))
            }
            HashAlgorithm::Sha256 => {
                let mut digest = [0u8; 32];
                reader.read_exact(&mut digest)?;
                Ok(ObjectId::Sha256(digest))
            }
        }
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hex form
    pub fn to_short_oid(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_OID_LENGTH);
        hex
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self> {
        Self::try_parse(id)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}
