//! Conversion between JSON values and NBT, used for text components which moved from JSON
//! strings to NBT in 1.20.3.

use crate::{Compound, Tag};
use serde_json::{Map, Number, Value};

/// Converts JSON to NBT. Booleans become bytes, integers become ints (longs when they do not
/// fit), other numbers become doubles. Lists whose elements differ in type are wrapped into
/// compounds under the empty key.
pub fn json_to_tag(value: &Value) -> Tag {
    match value {
        Value::Null => Tag::compound(),
        Value::Bool(b) => Tag::Byte(*b as i8),
        Value::Number(n) => number_to_tag(n),
        Value::String(s) => Tag::String(s.clone()),
        Value::Array(items) => {
            let tags: Vec<Tag> = items.iter().map(json_to_tag).collect();
            let homogeneous = tags
                .windows(2)
                .all(|pair| pair[0].get_type_id() == pair[1].get_type_id());
            if homogeneous {
                Tag::List(tags)
            } else {
                Tag::List(
                    tags.into_iter()
                        .map(|tag| match tag {
                            Tag::Compound(_) => tag,
                            other => {
                                let mut wrapper = Compound::new();
                                wrapper.insert(String::new(), other);
                                Tag::Compound(wrapper)
                            }
                        })
                        .collect(),
                )
            }
        }
        Value::Object(map) => Tag::Compound(
            map.iter()
                .map(|(key, value)| (key.clone(), json_to_tag(value)))
                .collect(),
        ),
    }
}

fn number_to_tag(n: &Number) -> Tag {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => Tag::Int(small),
            Err(_) => Tag::Long(i),
        }
    } else {
        Tag::Double(n.as_f64().unwrap_or_default())
    }
}

/// Converts NBT back to JSON, unwrapping the empty-key compounds [`json_to_tag`] produces.
pub fn tag_to_json(tag: &Tag) -> Value {
    match tag {
        Tag::End => Value::Null,
        Tag::Byte(v) => Value::from(*v),
        Tag::Short(v) => Value::from(*v),
        Tag::Int(v) => Value::from(*v),
        Tag::Long(v) => Value::from(*v),
        Tag::Float(v) => float_value(*v as f64),
        Tag::Double(v) => float_value(*v),
        Tag::ByteArray(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
        Tag::String(s) => Value::String(s.clone()),
        Tag::List(items) => Value::Array(
            items
                .iter()
                .map(|item| match item.as_compound() {
                    Some(compound) if compound.len() == 1 && compound.contains_key("") => {
                        tag_to_json(&compound[""])
                    }
                    _ => tag_to_json(item),
                })
                .collect(),
        ),
        Tag::Compound(map) => {
            let mut object = Map::with_capacity(map.len());
            for (key, value) in map {
                object.insert(key.clone(), tag_to_json(value));
            }
            Value::Object(object)
        }
        Tag::IntArray(v) => Value::Array(v.iter().map(|i| Value::from(*i)).collect()),
        Tag::LongArray(v) => Value::Array(v.iter().map(|l| Value::from(*l)).collect()),
    }
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
