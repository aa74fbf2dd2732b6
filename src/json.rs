//! JSON field access with strict and lenient validation

use base64::{engine::general_purpose, Engine as _};
use log::debug;
use serde_json::{Map, Value};

use crate::error::Error;

pub type JsonObject = Map<String, Value>;

pub(crate) fn encode_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub(crate) fn decode_base64(context: &str, field: &str, data: &str) -> Result<Vec<u8>, Error> {
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::InvalidJson(format!("{}: field '{}' is not valid base64: {}", context, field, e)))
}

/// Typed read access to the fields of one JSON object.
///
/// A `null` field is treated the same as an absent one.
pub(crate) struct JsonFields<'a> {
    context: &'static str,
    object: &'a JsonObject,
}

impl<'a> JsonFields<'a> {
    pub(crate) fn new(context: &'static str, object: &'a JsonObject) -> Self {
        Self { context, object }
    }

    pub(crate) fn from_value(context: &'static str, value: &'a Value) -> Result<Self, Error> {
        match value {
            Value::Object(object) => Ok(Self::new(context, object)),
            _ => Err(Error::InvalidJson(format!("{}: expected a JSON object", context))),
        }
    }

    fn error<S: AsRef<str>>(&self, message: S) -> Error {
        Error::InvalidJson(format!("{}: {}", self.context, message.as_ref()))
    }

    fn field(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name).filter(|v| !v.is_null())
    }

    /// Reject (strict) or log (lenient) fields outside of `allowed`
    pub(crate) fn check_fields(&self, allowed: &[&str], strict: bool) -> Result<(), Error> {
        for name in self.object.keys() {
            if !allowed.contains(&name.as_str()) {
                if strict {
                    return Err(self.error(format!("unrecognized field '{}'", name)));
                }
                debug!("{}: ignoring unrecognized field '{}'", self.context, name);
            }
        }
        Ok(())
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub(crate) fn string(&self, name: &str) -> Result<Option<&'a str>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.error(format!("field '{}' must be a string", name))),
        }
    }

    pub(crate) fn required_string(&self, name: &str) -> Result<&'a str, Error> {
        self.string(name)?
            .ok_or_else(|| self.error(format!("missing required field '{}'", name)))
    }

    pub(crate) fn boolean(&self, name: &str) -> Result<Option<bool>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.error(format!("field '{}' must be a boolean", name))),
        }
    }

    pub(crate) fn required_boolean(&self, name: &str) -> Result<bool, Error> {
        self.boolean(name)?
            .ok_or_else(|| self.error(format!("missing required field '{}'", name)))
    }

    pub(crate) fn integer(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.error(format!("field '{}' must be an integer", name))),
        }
    }

    pub(crate) fn unsigned(&self, name: &str) -> Result<Option<u32>, Error> {
        match self.integer(name)? {
            None => Ok(None),
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_| self.error(format!("field '{}' is out of range: {}", name, v))),
        }
    }

    pub(crate) fn required_unsigned(&self, name: &str) -> Result<u32, Error> {
        self.unsigned(name)?
            .ok_or_else(|| self.error(format!("missing required field '{}'", name)))
    }

    pub(crate) fn string_array(&self, name: &str) -> Result<Option<Vec<String>>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(ToOwned::to_owned)
                        .ok_or_else(|| self.error(format!("field '{}' must only contain strings", name)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(self.error(format!("field '{}' must be an array", name))),
        }
    }

    pub(crate) fn object(&self, name: &str) -> Result<Option<&'a JsonObject>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Object(o)) => Ok(Some(o)),
            Some(_) => Err(self.error(format!("field '{}' must be an object", name))),
        }
    }

    pub(crate) fn required_object(&self, name: &str) -> Result<&'a JsonObject, Error> {
        self.object(name)?
            .ok_or_else(|| self.error(format!("missing required field '{}'", name)))
    }

    pub(crate) fn object_array(&self, name: &str) -> Result<Option<Vec<&'a JsonObject>>, Error> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| self.error(format!("field '{}' must only contain objects", name)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(self.error(format!("field '{}' must be an array", name))),
        }
    }

    pub(crate) fn base64(&self, name: &str) -> Result<Option<Vec<u8>>, Error> {
        self.string(name)?
            .map(|s| decode_base64(self.context, name, s))
            .transpose()
    }
}
