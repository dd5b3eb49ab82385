//! Reply Coercion
//!
//! This module turns raw decoded [`Reply`] values into the semantically
//! typed [`Value`] a caller expects, selected by the command descriptor's
//! [`ReplyKind`] - never by inspecting the dynamic shape of the reply at
//! the call site.
//!
//! Coercion is a pure function. It runs after the client has already
//! turned `-ERR` replies into failed calls, so the only errors it can
//! produce are protocol-level shape violations (plus the status checks of
//! the `Ok`/`Pong`/`Queued` kinds, which treat an unexpected status as a
//! server-side failure).

use crate::commands::table::ReplyKind;
use crate::error::{Error, Result};
use crate::protocol::{ProtocolError, Reply};
use bytes::Bytes;

/// A coerced command result.
///
/// This is what [`Client::call`] returns: the raw reply projected through
/// the command's [`ReplyKind`].
///
/// [`Client::call`]: crate::client::Client::call
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (null bulk string or null array under `Raw` coercion).
    Nil,
    /// Boolean result (`Ok`/`Pong`/`Queued`/`Bool` kinds).
    Bool(bool),
    /// Integer result.
    Int(i64),
    /// Floating point result.
    Float(f64),
    /// Status line surfaced under `Raw` coercion.
    Status(String),
    /// Binary-safe string payload.
    Bytes(Bytes),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Ordered field/value pairs, preserving wire order.
    Map(Vec<(Bytes, Value)>),
}

impl Value {
    /// Returns true if this value is `Nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// A short name for this value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Status(_) => "status",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Attempts to view the payload of a bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// Attempts to extract the inner boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract the inner integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Consumes self and returns the payload if this is a bytes value.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Value::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// Consumes self and returns the elements if this is an array value.
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes self and returns the pairs if this is a map value.
    pub fn into_map(self) -> Option<Vec<(Bytes, Value)>> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }
}

/// Applies the coercion selected by `kind` to a raw reply.
pub fn coerce(kind: ReplyKind, reply: Reply) -> Result<Value> {
    match kind {
        ReplyKind::Ok => status_check(reply, "OK"),
        ReplyKind::Pong => status_check(reply, "PONG"),
        ReplyKind::Queued => status_check(reply, "QUEUED"),
        ReplyKind::Bool => match reply {
            Reply::Integer(n) => Ok(Value::Bool(n != 0)),
            other => Err(unexpected("integer", &other)),
        },
        ReplyKind::Int => match reply {
            Reply::Integer(n) => Ok(Value::Int(n)),
            // Some replies carry numbers as bulk strings; the source cast
            // them to int, so a numeric payload is accepted here too.
            Reply::Bulk(Some(data)) => parse_number::<i64>(&data).map(Value::Int),
            other => Err(unexpected("integer", &other)),
        },
        ReplyKind::Float => match reply {
            Reply::Bulk(Some(data)) => parse_number::<f64>(&data).map(Value::Float),
            Reply::Status(s) => parse_number::<f64>(s.as_bytes()).map(Value::Float),
            Reply::Integer(n) => Ok(Value::Float(n as f64)),
            other => Err(unexpected("numeric", &other)),
        },
        ReplyKind::Array => match reply {
            // A null multibulk reply is an empty result, not an absent one.
            Reply::Array(None) => Ok(Value::Array(Vec::new())),
            Reply::Array(Some(items)) => {
                Ok(Value::Array(items.into_iter().map(raw_value).collect()))
            }
            other => Err(unexpected("array", &other)),
        },
        ReplyKind::Assoc => match reply {
            Reply::Array(None) => Ok(Value::Map(Vec::new())),
            Reply::Array(Some(items)) => regroup_pairs(items),
            other => Err(unexpected("array", &other)),
        },
        ReplyKind::Raw => Ok(raw_value(reply)),
    }
}

/// Identity mapping from a raw reply to a value.
fn raw_value(reply: Reply) -> Value {
    match reply {
        Reply::Status(s) => Value::Status(s),
        // Error replies are intercepted by the client before coercion;
        // under Raw the message degrades to a status for completeness.
        Reply::Error(s) => Value::Status(s),
        Reply::Integer(n) => Value::Int(n),
        Reply::Bulk(Some(data)) => Value::Bytes(data),
        Reply::Bulk(None) => Value::Nil,
        Reply::Array(Some(items)) => Value::Array(items.into_iter().map(raw_value).collect()),
        Reply::Array(None) => Value::Nil,
    }
}

/// Regroups a flat `[k0, v0, k1, v1, ...]` sequence into ordered pairs.
///
/// An odd-length sequence is a protocol invariant violation: failing here
/// beats silently dropping the last element.
fn regroup_pairs(items: Vec<Reply>) -> Result<Value> {
    if items.len() % 2 != 0 {
        return Err(Error::Protocol(ProtocolError::OddPairCount(items.len())));
    }

    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match key {
            Reply::Bulk(Some(data)) => data,
            other => return Err(unexpected("bulk string key", &other)),
        };
        pairs.push((key, raw_value(value)));
    }
    Ok(Value::Map(pairs))
}

fn status_check(reply: Reply, expected: &str) -> Result<Value> {
    match reply {
        Reply::Status(s) if s == expected => Ok(Value::Bool(true)),
        // A well-formed but different status is the server disagreeing,
        // not a framing problem.
        Reply::Status(s) => Err(Error::Server(s)),
        other => Err(unexpected("status", &other)),
    }
}

fn parse_number<T: std::str::FromStr>(data: &[u8]) -> Result<T> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            Error::Protocol(ProtocolError::Malformed(format!(
                "non-numeric payload: {:?}",
                String::from_utf8_lossy(data)
            )))
        })
}

fn unexpected(expected: &'static str, got: &Reply) -> Error {
    let got = match got {
        Reply::Status(_) => "status",
        Reply::Error(_) => "error",
        Reply::Integer(_) => "integer",
        Reply::Bulk(Some(_)) => "bulk string",
        Reply::Bulk(None) => "null bulk string",
        Reply::Array(Some(_)) => "array",
        Reply::Array(None) => "null array",
    };
    Error::Protocol(ProtocolError::UnexpectedReply { expected, got })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_status_coerces_to_true() {
        let value = coerce(ReplyKind::Ok, Reply::status("OK")).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_unexpected_status_is_server_error() {
        let err = coerce(ReplyKind::Ok, Reply::status("BUSY")).unwrap_err();
        assert!(matches!(err, Error::Server(s) if s == "BUSY"));
    }

    #[test]
    fn test_pong_status() {
        let value = coerce(ReplyKind::Pong, Reply::status("PONG")).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_queued_status() {
        let value = coerce(ReplyKind::Queued, Reply::status("QUEUED")).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_bool_from_integer() {
        assert_eq!(
            coerce(ReplyKind::Bool, Reply::Integer(1)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            coerce(ReplyKind::Bool, Reply::Integer(0)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            coerce(ReplyKind::Bool, Reply::Integer(7)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_bool_rejects_non_integer() {
        let err = coerce(ReplyKind::Bool, Reply::status("OK")).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedReply { .. })
        ));
    }

    #[test]
    fn test_int_from_integer_and_bulk() {
        assert_eq!(
            coerce(ReplyKind::Int, Reply::Integer(42)).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            coerce(ReplyKind::Int, Reply::bulk(Bytes::from("42"))).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_float_from_bulk() {
        assert_eq!(
            coerce(ReplyKind::Float, Reply::bulk(Bytes::from("3.25"))).unwrap(),
            Value::Float(3.25)
        );
    }

    #[test]
    fn test_float_rejects_garbage() {
        let err = coerce(ReplyKind::Float, Reply::bulk(Bytes::from("abc"))).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_null_array_coerces_to_empty_sequence() {
        assert_eq!(
            coerce(ReplyKind::Array, Reply::Array(None)).unwrap(),
            Value::Array(Vec::new())
        );
    }

    #[test]
    fn test_array_preserves_order_and_nulls() {
        let reply = Reply::array(vec![
            Reply::bulk(Bytes::from("a")),
            Reply::Bulk(None),
            Reply::bulk(Bytes::from("c")),
        ]);
        assert_eq!(
            coerce(ReplyKind::Array, reply).unwrap(),
            Value::Array(vec![
                Value::Bytes(Bytes::from("a")),
                Value::Nil,
                Value::Bytes(Bytes::from("c")),
            ])
        );
    }

    #[test]
    fn test_assoc_regroups_pairs_in_order() {
        let reply = Reply::array(vec![
            Reply::bulk(Bytes::from("field1")),
            Reply::bulk(Bytes::from("value1")),
            Reply::bulk(Bytes::from("field2")),
            Reply::Integer(2),
        ]);
        assert_eq!(
            coerce(ReplyKind::Assoc, reply).unwrap(),
            Value::Map(vec![
                (Bytes::from("field1"), Value::Bytes(Bytes::from("value1"))),
                (Bytes::from("field2"), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn test_assoc_odd_length_is_protocol_error() {
        let reply = Reply::array(vec![
            Reply::bulk(Bytes::from("field1")),
            Reply::bulk(Bytes::from("value1")),
            Reply::bulk(Bytes::from("orphan")),
        ]);
        let err = coerce(ReplyKind::Assoc, reply).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::OddPairCount(3))
        ));
    }

    #[test]
    fn test_raw_maps_nulls_to_nil() {
        assert_eq!(coerce(ReplyKind::Raw, Reply::Bulk(None)).unwrap(), Value::Nil);
        assert_eq!(coerce(ReplyKind::Raw, Reply::Array(None)).unwrap(), Value::Nil);
    }

    #[test]
    fn test_raw_passes_payload_through() {
        assert_eq!(
            coerce(ReplyKind::Raw, Reply::bulk(Bytes::from("foobar"))).unwrap(),
            Value::Bytes(Bytes::from("foobar"))
        );
        assert_eq!(
            coerce(ReplyKind::Raw, Reply::status("string")).unwrap(),
            Value::Status("string".to_string())
        );
    }
}
