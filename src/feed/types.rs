use serde::{Deserialize, Serialize};

use crate::cache::Resource;
use crate::error::DecodeError;

/// The whole catalog feed, in published order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDocument {
  pub results: Vec<Record>,
}

/// One catalog entry. Every field is required; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
  pub name: String,
  pub height: String,
  pub mass: String,
  pub hair_color: String,
  pub skin_color: String,
  pub eye_color: String,
  pub birth_year: String,
  pub gender: String,
  /// URL of the record's picture
  pub image: String,
}

impl Resource for FeedDocument {
  fn namespace() -> &'static str {
    "star_wars_cat_feed"
  }

  fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Err(DecodeError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
  }
}


#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;

  #[test]
  fn test_decode_chewbacca() {
    let doc = FeedDocument::decode(CHEWBACCA_FEED.as_bytes()).unwrap();
    assert_eq!(doc.results.len(), 1);
    let chewie = &doc.results[0];
    assert_eq!(chewie.name, "Chewbacca");
    assert_eq!(chewie.birth_year, "200BBY");
    assert_eq!(chewie.image, "http://x/c.png");
  }

  #[test]
  fn test_reencode_preserves_records() {
    let doc = FeedDocument::decode(TRIO_FEED.as_bytes()).unwrap();
    let reencoded = serde_json::to_vec(&doc).unwrap();
    assert_eq!(FeedDocument::decode(&reencoded).unwrap(), doc);
    let names: Vec<_> = doc.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Luke Skywalker", "Leia Organa", "Darth Vader"]);
  }

  #[test]
  fn test_extra_fields_tolerated() {
    let json = CHEWBACCA_FEED.replace(r#""gender":"male""#, r#""gender":"male","homeworld":"Kashyyyk""#);
    let doc = FeedDocument::decode(json.as_bytes()).unwrap();
    assert_eq!(doc.results[0].gender, "male");
  }

  #[test]
  fn test_missing_field_rejected() {
    let json = CHEWBACCA_FEED.replace(r#""mass":"112","#, "");
    assert!(matches!(
      FeedDocument::decode(json.as_bytes()),
      Err(DecodeError::Json(_))
    ));
  }

  #[test]
  fn test_non_string_field_rejected() {
    let json = CHEWBACCA_FEED.replace(r#""height":"228""#, r#""height":228"#);
    assert!(FeedDocument::decode(json.as_bytes()).is_err());
  }

  #[test]
  fn test_empty_and_malformed_rejected() {
    assert!(matches!(FeedDocument::decode(b""), Err(DecodeError::Empty)));
    assert!(matches!(FeedDocument::decode(b"  \n"), Err(DecodeError::Empty)));
    assert!(matches!(
      FeedDocument::decode(b"{\"results\": ["),
      Err(DecodeError::Json(_))
    ));
    assert!(FeedDocument::decode(b"{}").is_err());
  }
}
