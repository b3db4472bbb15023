//! Wire protocol for the pixel-canvas WebSocket endpoint.
//!
//! Clients send UTF-8 text frames carrying a [`PixelWrite`] JSON object.
//! The server answers each parsed write with the [`ACK`] text frame and
//! broadcasts the full canvas as a binary frame to every subscriber.

use serde::{Deserialize, Serialize};

/// Required first path segment of the upgrade request target.
pub const ENDPOINT: &str = "tile";

/// Text acknowledgment payload sent after each parsed pixel write.
pub const ACK: &str = "OK";

/// Value of the `Server` header on the upgrade response.
pub const SERVER_NAME: &str = "tileboard";

/// A single-pixel write request: `{"x": <int>, "y": <int>, "color": <int>}`.
///
/// Fields are plain JSON integers. Missing or mistyped fields fail
/// deserialization and the message is dropped; out-of-range values parse
/// fine and are rejected by the canvas store instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PixelWrite {
    pub x: i64,
    pub y: i64,
    pub color: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pixel_write() {
        let write: PixelWrite = serde_json::from_str(r#"{"x":5,"y":5,"color":3}"#).unwrap();
        assert_eq!(write.x, 5);
        assert_eq!(write.y, 5);
        assert_eq!(write.color, 3);
    }

    #[test]
    fn test_parse_negative_coordinates() {
        // Negative values are a domain error, not a parse error
        let write: PixelWrite = serde_json::from_str(r#"{"x":-1,"y":0,"color":0}"#).unwrap();
        assert_eq!(write.x, -1);
    }

    #[test]
    fn test_reject_missing_field() {
        assert!(serde_json::from_str::<PixelWrite>(r#"{"x":5,"y":5}"#).is_err());
    }

    #[test]
    fn test_reject_mistyped_field() {
        assert!(serde_json::from_str::<PixelWrite>(r#"{"x":5,"y":5,"color":"red"}"#).is_err());
        assert!(serde_json::from_str::<PixelWrite>(r#"{"x":5,"y":5,"color":3.5}"#).is_err());
    }

    #[test]
    fn test_reject_non_json() {
        assert!(serde_json::from_str::<PixelWrite>("not json").is_err());
    }
}
