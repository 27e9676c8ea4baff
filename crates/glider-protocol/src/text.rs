//! Chat/text components. Sent as JSON strings until 1.20.3, as NBT afterwards.

use crate::buffer::PacketBuffer;
use crate::codec::Codec;
use glider_common::{ProtocolError, ProtocolVersion, Result};
use glider_nbt::{json_to_tag, tag_to_json, Tag};
use serde_json::Value;

/// Upper bound on the JSON form, in characters.
pub const MAX_JSON_CHARS: usize = 262_144;

/// A text component in whichever representation it was received in.
#[derive(Debug, Clone, PartialEq)]
pub enum TextComponent {
    Json(Value),
    Nbt(Tag),
}

impl TextComponent {
    /// Plain unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        TextComponent::Json(Value::String(text.into()))
    }

    pub fn to_json(&self) -> Value {
        match self {
            TextComponent::Json(value) => value.clone(),
            TextComponent::Nbt(tag) => tag_to_json(tag),
        }
    }

    pub fn to_nbt(&self) -> Tag {
        match self {
            TextComponent::Json(value) => json_to_tag(value),
            TextComponent::Nbt(tag) => tag.clone(),
        }
    }
}

impl From<&str> for TextComponent {
    fn from(text: &str) -> Self {
        TextComponent::plain(text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

pub const TEXT: TextCodec = TextCodec;

fn uses_nbt(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_20_3
}

impl Codec<TextComponent> for TextCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<TextComponent> {
        if uses_nbt(version) {
            let tag = buf
                .read_nbt(version)?
                .ok_or_else(|| ProtocolError::invalid("text component is missing"))?;
            return Ok(TextComponent::Nbt(tag));
        }
        let json = buf.read_string_bounded(MAX_JSON_CHARS)?;
        let value = serde_json::from_str(&json)
            .map_err(|e| ProtocolError::invalid(format!("malformed text component: {}", e)))?;
        Ok(TextComponent::Json(value))
    }

    fn encode(&self, value: &TextComponent, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        if uses_nbt(version) {
            return buf.write_nbt(Some(&value.to_nbt()), version);
        }
        let json = serde_json::to_string(&value.to_json())
            .map_err(|e| ProtocolError::invalid(format!("unserialisable text component: {}", e)))?;
        buf.write_string_bounded(&json, MAX_JSON_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from, encode_to_vec};
    use serde_json::json;

    #[test]
    fn test_json_before_1_20_3() {
        let text = TextComponent::Json(json!({"text": "hi"}));
        let bytes = encode_to_vec(&TEXT, &text, ProtocolVersion::V1_20_2).unwrap();
        assert_eq!(bytes[0] as usize, bytes.len() - 1);
        assert_eq!(&bytes[1..], br#"{"text":"hi"}"#);
        assert_eq!(decode_from(&TEXT, &bytes, ProtocolVersion::V1_20_2).unwrap(), text);
    }

    #[test]
    fn test_nbt_from_1_20_3() {
        let text = TextComponent::plain("hi");
        let bytes = encode_to_vec(&TEXT, &text, ProtocolVersion::V1_20_3).unwrap();
        // TAG_String, u16 length, payload
        assert_eq!(bytes, vec![8, 0, 2, b'h', b'i']);
        let decoded = decode_from(&TEXT, &bytes, ProtocolVersion::V1_20_3).unwrap();
        assert_eq!(decoded, TextComponent::Nbt(Tag::String("hi".into())));
        assert_eq!(decoded.to_json(), json!("hi"));
    }

    #[test]
    fn test_malformed_json() {
        let mut buf = PacketBuffer::new();
        buf.write_string("{not json").unwrap();
        assert!(TEXT.decode(&mut buf, ProtocolVersion::V1_16).is_err());
    }
}
