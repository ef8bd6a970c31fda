pub mod error;

pub use error::*;

use mongodb::bson::oid::ObjectId;

/// Parses a path/body identifier, naming the resource in the 400 it produces.
pub fn parse_object_id(raw: &str, what: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::InvalidRequest(format!("Invalid {} ID", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("65f1a2b3c4d5e6f708091a2b", "offer").is_ok());

        let err = parse_object_id("not-an-id", "offer").unwrap_err();
        assert_eq!(err.to_string(), "Invalid offer ID");
    }
}
