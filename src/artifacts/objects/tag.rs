//! Annotated tag object
//!
//! ## Format
//!
//! ```text
//! tag <size>\0
//! object <target-id>
//! type <target-kind>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::{MalformedObject, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Signature,
    message: String,
}

impl Tag {
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> &Signature {
        &self.tagger
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Packable for Tag {
    fn serialize(&self) -> Bytes {
        Bytes::from(self.display())
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead, algorithm: HashAlgorithm) -> Result<Self, MalformedObject> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let content = String::from_utf8(content)?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| MalformedObject::new("tag without message separator".into()))?;

        let mut target = None;
        let mut target_type = None;
        let mut name = None;
        let mut tagger = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| MalformedObject::new(format!("invalid tag header '{line}'")))?;

            match key {
                "object" => {
                    let oid = ObjectId::try_parse(value)
                        .ok()
                        .filter(|oid| oid.algorithm() == algorithm)
                        .ok_or_else(|| MalformedObject::new(format!("invalid tag target '{value}'")))?;
                    target = Some(oid);
                }
                "type" => target_type = Some(ObjectType::try_from(value)?),
                "tag" => name = Some(value.to_string()),
                "tagger" => tagger = Some(Signature::try_from(value)?),
                _ => {}
            }
        }

        Ok(Tag {
            target: target.ok_or_else(|| MalformedObject::new("tag without object".into()))?,
            target_type: target_type
                .ok_or_else(|| MalformedObject::new("tag without type".into()))?,
            name: name.ok_or_else(|| MalformedObject::new("tag without name".into()))?,
            tagger: tagger.ok_or_else(|| MalformedObject::new("tag without tagger".into()))?,
            message: message.to_string(),
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        format!(
            "object {}\ntype {}\ntag {}\ntagger {}\n\n{}",
            self.target,
            self.target_type,
            self.name,
            self.tagger.display(),
            self.message
        )
    }
}
