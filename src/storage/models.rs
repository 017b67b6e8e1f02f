use crate::error::{MigrationError, Result};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_smithy_types::base64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Rohes DynamoDB Item wie es der SDK liefert
pub type Item = HashMap<String, AttributeValue>;

pub const ATTR_OBJECT_ID: &str = "ObjectId";
pub const ATTR_UPDATED: &str = "Updated";

/// Attributwert im DynamoDB JSON Format (`{"S": "..."}`, `{"N": "..."}`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeJson {
    S(String),
    N(String),
    /// Base64 kodiert
    B(String),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
    M(BTreeMap<String, AttributeJson>),
    L(Vec<AttributeJson>),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "BOOL")]
    Bool(bool),
}

impl TryFrom<&AttributeValue> for AttributeJson {
    type Error = MigrationError;

    fn try_from(value: &AttributeValue) -> Result<Self> {
        Ok(match value {
            AttributeValue::S(s) => AttributeJson::S(s.clone()),
            AttributeValue::N(n) => AttributeJson::N(n.clone()),
            AttributeValue::B(b) => AttributeJson::B(base64::encode(b.as_ref())),
            AttributeValue::Ss(ss) => AttributeJson::Ss(ss.clone()),
            AttributeValue::Ns(ns) => AttributeJson::Ns(ns.clone()),
            AttributeValue::Bs(bs) => {
                AttributeJson::Bs(bs.iter().map(|b| base64::encode(b.as_ref())).collect())
            }
            AttributeValue::M(m) => AttributeJson::M(
                m.iter()
                    .map(|(k, v)| Ok((k.clone(), AttributeJson::try_from(v)?)))
                    .collect::<Result<_>>()?,
            ),
            AttributeValue::L(l) => AttributeJson::L(
                l.iter()
                    .map(AttributeJson::try_from)
                    .collect::<Result<_>>()?,
            ),
            AttributeValue::Null(n) => AttributeJson::Null(*n),
            AttributeValue::Bool(b) => AttributeJson::Bool(*b),
            other => {
                return Err(MigrationError::MalformedArtifact(format!(
                    "unsupported attribute type: {:?}",
                    other
                )))
            }
        })
    }
}

impl TryFrom<&AttributeJson> for AttributeValue {
    type Error = MigrationError;

    fn try_from(value: &AttributeJson) -> Result<Self> {
        Ok(match value {
            AttributeJson::S(s) => AttributeValue::S(s.clone()),
            AttributeJson::N(n) => AttributeValue::N(n.clone()),
            AttributeJson::B(b) => AttributeValue::B(decode_blob(b)?),
            AttributeJson::Ss(ss) => AttributeValue::Ss(ss.clone()),
            AttributeJson::Ns(ns) => AttributeValue::Ns(ns.clone()),
            AttributeJson::Bs(bs) => {
                AttributeValue::Bs(bs.iter().map(|b| decode_blob(b)).collect::<Result<_>>()?)
            }
            AttributeJson::M(m) => AttributeValue::M(
                m.iter()
                    .map(|(k, v)| Ok((k.clone(), AttributeValue::try_from(v)?)))
                    .collect::<Result<_>>()?,
            ),
            AttributeJson::L(l) => AttributeValue::L(
                l.iter()
                    .map(AttributeValue::try_from)
                    .collect::<Result<_>>()?,
            ),
            AttributeJson::Null(n) => AttributeValue::Null(*n),
            AttributeJson::Bool(b) => AttributeValue::Bool(*b),
        })
    }
}

fn decode_blob(encoded: &str) -> Result<Blob> {
    base64::decode(encoded)
        .map(Blob::new)
        .map_err(|e| MigrationError::MalformedArtifact(format!("invalid base64 blob: {}", e)))
}

/// Ein exportierter Datensatz, Attribute bleiben unverändert erhalten
pub type Record = BTreeMap<String, AttributeJson>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutRequest {
    #[serde(rename = "Item")]
    pub item: Record,
}

/// `{"PutRequest": {"Item": {...}}}`, ein Eintrag im Export Artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    #[serde(rename = "PutRequest")]
    pub put_request: PutRequest,
}

impl WriteRequest {
    pub fn put(item: Record) -> Self {
        Self {
            put_request: PutRequest { item },
        }
    }

    /// Konvertiere ein gescanntes Item in einen Write Request
    pub fn from_item(item: &Item) -> Result<Self> {
        let record = item
            .iter()
            .map(|(k, v)| Ok((k.clone(), AttributeJson::try_from(v)?)))
            .collect::<Result<Record>>()?;
        Ok(Self::put(record))
    }

    /// Zurück ins SDK Format für BatchWriteItem
    pub fn to_item(&self) -> Result<Item> {
        self.put_request
            .item
            .iter()
            .map(|(k, v)| Ok((k.clone(), AttributeValue::try_from(v)?)))
            .collect()
    }

    pub fn object_id(&self) -> Result<&str> {
        match self.put_request.item.get(ATTR_OBJECT_ID) {
            Some(AttributeJson::S(id)) => Ok(id),
            Some(other) => Err(MigrationError::MalformedArtifact(format!(
                "{} is not a string: {:?}",
                ATTR_OBJECT_ID, other
            ))),
            None => Err(MigrationError::MalformedArtifact(format!(
                "record without {}",
                ATTR_OBJECT_ID
            ))),
        }
    }
}

/// Objekt Metadaten aus einem Bucket Listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}
