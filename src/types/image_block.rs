use serde::{Deserialize, Serialize};

/// The source type for an image block, which can be either Base64 encoded or a URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ImageSource {
    /// A Base64 encoded image source.
    #[serde(rename = "base64")]
    Base64 {
        /// The media type, e.g. `image/png`.
        media_type: String,
        /// The base64-encoded bytes.
        data: String,
    },

    /// A URL image source.
    #[serde(rename = "url")]
    Url {
        /// The URL of the image.
        url: String,
    },
}

/// An image attached to a turn.  Never rendered into a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageBlock {
    /// The source of the image.
    pub source: ImageSource,
}

impl ImageBlock {
    /// Create a new `ImageBlock` with the given source.
    pub fn new(source: ImageSource) -> Self {
        Self { source }
    }

    /// Create a new `ImageBlock` pointing at a URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(ImageSource::Url { url: url.into() })
    }

    /// Create a new `ImageBlock` from base64 data.
    pub fn from_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(ImageSource::Base64 {
            media_type: media_type.into(),
            data: data.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn url_source_serialization() {
        let block = ImageBlock::from_url("https://example.com/image.jpg");
        assert_eq!(
            to_value(&block).unwrap(),
            json!({"source": {"type": "url", "url": "https://example.com/image.jpg"}})
        );
    }
}
