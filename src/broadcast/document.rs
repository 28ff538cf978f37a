//! Read-only view over a node's error document.
//!
//! Expected shape (the `error` wrapper is optional):
//! `{"error": {"data": {"code": 10, "message": "..", "stack": [{"format": "..", "data": {..}}]}}}`.
//! Structural requirements are reported as [`Error::MalformedResponse`]; every other
//! lookup returns `None` when the field is missing or has the wrong type.

use serde_json::{Map, Value};

use crate::error::Error;

const CALL_METHOD: &str = "call.method";
const CALL_PARAMS: &str = "call.params";
const TRX_IX: &str = "trx_ix";

/// One frame of the node's diagnostic stack.
#[derive(Debug)]
pub(crate) struct StackFrame<'a> {
    pub format: &'a str,
    data: Option<&'a Map<String, Value>>,
}

impl<'a> StackFrame<'a> {
    fn from_value(index: usize, frame: &'a Value) -> Result<Self, Error> {
        let format = frame
            .get("format")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("stack[{index}].format is not a string")))?;
        // A string `data` carries no fields; every other non-object shape is a fault.
        let data = match frame.get("data") {
            Some(Value::Object(data)) => Some(data),
            Some(Value::String(_)) => None,
            _ => {
                return Err(malformed(format!("stack[{index}].data is not an object")));
            }
        };
        Ok(Self { format, data })
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        self.data.and_then(|data| data.get(key))
    }
}

#[derive(Debug)]
pub(crate) struct ErrorDocument<'a> {
    data: &'a Map<String, Value>,
    frames: Vec<StackFrame<'a>>,
}

impl<'a> ErrorDocument<'a> {
    pub fn from_response(response: &'a Value) -> Result<Self, Error> {
        if !response.is_object() {
            return Err(malformed("response is not an object".into()));
        }
        let error = response
            .get("error")
            .filter(|error| is_truthy(error))
            .unwrap_or(response);
        let data = error
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("error.data is not an object".into()))?;
        let stack = data
            .get("stack")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("error.data.stack is not an array".into()))?;
        let frames = stack
            .iter()
            .enumerate()
            .map(|(i, frame)| StackFrame::from_value(i, frame))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { data, frames })
    }

    /// `error.data.code`; non-integer codes read as absent.
    pub fn code(&self) -> Option<i64> {
        self.data.get("code").and_then(Value::as_i64)
    }

    pub fn message(&self) -> Option<&'a str> {
        self.data.get("message").and_then(Value::as_str)
    }

    pub fn formats(&self) -> Vec<&'a str> {
        self.frames.iter().map(|frame| frame.format).collect()
    }

    pub fn joined_formats(&self) -> String {
        self.frames
            .iter()
            .map(|frame| frame.format)
            .filter(|format| !format.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `call.params` of the first frame recorded at the `call` boundary.
    pub fn call_origin(&self) -> Option<&'a Value> {
        self.frames
            .iter()
            .find(|frame| frame.field(CALL_METHOD).and_then(Value::as_str) == Some("call"))
            .and_then(|frame| frame.field(CALL_PARAMS))
            .filter(|params| !params.is_null())
    }

    pub fn transaction_id(&self) -> Option<String> {
        self.frames
            .iter()
            .find_map(|frame| frame.field(TRX_IX).filter(|v| is_truthy(v)))
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn malformed(reason: String) -> Error {
    Error::MalformedResponse { reason }
}
