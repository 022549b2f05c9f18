//! Constant-pool values and the `Chunk` they live in, plus the artifact's
//! `{"type": T, "data": D}` JSON envelope (§6), with `Null` as the one
//! documented exception: it serialises as a bare JSON `null`.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A compiled code object: bytes, constant pool, and a per-byte line table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<Value>,
    pub lines: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionValue {
    pub name: String,
    pub arity: usize,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleValue {
    pub globals_count: usize,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassValue {
    pub name: String,
    pub methods: Vec<FunctionValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    String(String),
    Function(FunctionValue),
    Module(ModuleValue),
    Class(ClassValue),
}

impl Value {
    fn type_tag(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Boolean(_) => "Boolean",
            Value::Null => "Null",
            Value::String(_) => "String",
            Value::Function(_) => "Function",
            Value::Module(_) => "Module",
            Value::Class(_) => "Class",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Value::Null = self {
            return serializer.serialize_unit();
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", self.type_tag())?;
        match self {
            Value::Integer(n) => map.serialize_entry("data", n)?,
            Value::Boolean(b) => map.serialize_entry("data", b)?,
            Value::String(s) => map.serialize_entry("data", s)?,
            Value::Function(f) => map.serialize_entry("data", f)?,
            Value::Module(m) => map.serialize_entry("data", m)?,
            Value::Class(c) => map.serialize_entry("data", c)?,
            Value::Null => unreachable!(),
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a loop Value envelope or null")
            }

            fn visit_unit<E>(self) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut ty: Option<String> = None;
                let mut data: Option<serde_json::Value> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "type" => ty = Some(map.next_value()?),
                        "data" => data = Some(map.next_value()?),
                        _ => {
                            let _: de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                let ty = ty.ok_or_else(|| de::Error::missing_field("type"))?;
                let value = match ty.as_str() {
                    "Null" => return Ok(Value::Null),
                    "Integer" => Value::Integer(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    "Boolean" => Value::Boolean(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    "String" => Value::String(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    "Function" => Value::Function(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    "Module" => Value::Module(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    "Class" => Value::Class(
                        serde_json::from_value(data.ok_or_else(|| de::Error::missing_field("data"))?)
                            .map_err(de::Error::custom)?,
                    ),
                    other => return Err(de::Error::unknown_variant(other, &[
                        "Integer", "Boolean", "Null", "String", "Function", "Module", "Class",
                    ])),
                };
                Ok(value)
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
