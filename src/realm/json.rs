//! JSON bridge: turn `serde_json` data into host values

use crate::error::Error;
use crate::realm::Realm;
use crate::value::{Property, Value};

impl Realm {
    /// Convert parsed JSON into host values. Objects become plain objects
    /// (usable as mixins), arrays become arrays.
    pub fn value_from_json(&mut self, json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(self.intern(s)),
            serde_json::Value::Array(items) => {
                let elements = items.iter().map(|item| self.value_from_json(item)).collect();
                Value::Object(self.array(elements))
            }
            serde_json::Value::Object(map) => {
                let obj = self.object();
                for (key, value) in map {
                    let value = self.value_from_json(value);
                    let key = self.intern(key);
                    obj.borrow_mut().define_property(key, Property::data(value));
                }
                Value::Object(obj)
            }
        }
    }

    /// Parse JSON text and convert it
    pub fn parse_json(&mut self, source: &str) -> Result<Value, Error> {
        let json: serde_json::Value = serde_json::from_str(source)
            .map_err(|e| Error::runtime_error("SyntaxError", format!("invalid JSON: {}", e)))?;
        Ok(self.value_from_json(&json))
    }
}
