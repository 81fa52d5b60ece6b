use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::EvmAddress;
use crate::TokenId;

/// One attribute entry from an ERC721 metadata document. `value` is left
/// free-form because collections put strings, numbers and nested objects
/// in there.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NftAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_type: Option<String>,
    #[serde(default)]
    pub value: Value,
}

/// The standard ERC721 metadata-JSON shape. Every field is optional and
/// unknown fields are ignored; collections are sloppy about this format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<NftAttribute>,
}

/// A resolved token record: the id plus whatever the detail fetcher could
/// recover for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Erc721Token {
    pub id: TokenId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EvmAddress>,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NftMetadata>,
}

impl Erc721Token {
    /// Record for a token whose metadata could not be resolved.
    pub fn bare(id: TokenId) -> Self {
        Erc721Token {
            id,
            owner: None,
            uri: String::new(),
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_metadata_document() {
        let doc = r#"{
            "name": "Blue Gem #7",
            "description": "A shiny one.",
            "image": "ipfs://QmYx/7.png",
            "attributes": [
                {"trait_type": "Color", "value": "blue"},
                {"trait_type": "Level", "value": 3}
            ],
            "compiler": "some-tool-this-crate-never-heard-of"
        }"#;
        let meta: NftMetadata = serde_json::from_str(doc).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Blue Gem #7"));
        assert_eq!(meta.attributes.len(), 2);
        assert_eq!(meta.attributes[1].value, Value::from(3));
        assert!(meta.external_url.is_none());
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let meta: NftMetadata = serde_json::from_str(r#"{"name": "n"}"#).unwrap();
        assert!(meta.attributes.is_empty());
    }

    #[test]
    fn bare_record_has_no_metadata() {
        let record = Erc721Token::bare(TokenId::from(9u64));
        assert_eq!(record.id, TokenId::from(9u64));
        assert!(record.metadata.is_none());
        assert!(record.uri.is_empty());
    }

    #[test]
    fn record_serializes_id_and_skips_empty_fields() {
        let record = Erc721Token::bare(TokenId::from(1u64));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("metadata").is_none());
        assert!(json.get("owner").is_none());
        assert!(json.get("id").is_some());
    }
}
