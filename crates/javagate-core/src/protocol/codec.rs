//! Value encoding and response decoding.
//!
//! Encoding turns a [`Value`] into a single type-tagged command part ending
//! in one newline. Decoding takes a full response line, dispatches on the
//! response code (`y` success, `x` error, `z` fatal), and rebuilds the value
//! by tag — wrapping reference tags into the matching proxy kind via the
//! client.

use crate::callback::CallbackRegistry;
use crate::client::GatewayClient;
use crate::error::{GatewayError, Result};
use crate::protocol::{self, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode one value as a newline-terminated command part.
///
/// Callback references are registered in `registry` as a side effect so the
/// JVM receives a resolvable proxy ID.
pub fn encode_part(value: &Value, registry: &CallbackRegistry) -> Result<String> {
    let mut part = String::new();
    match value {
        Value::Null => part.push(protocol::NULL_TYPE),
        Value::Bool(b) => {
            part.push(protocol::BOOLEAN_TYPE);
            part.push_str(if *b { "true" } else { "false" });
        }
        Value::Int(i) => {
            part.push(protocol::INT_TYPE);
            part.push_str(&i.to_string());
        }
        Value::Long(n) => {
            // The gateway distinguishes int and long by range, not by the
            // local type.
            if i32::try_from(*n).is_ok() {
                part.push(protocol::INT_TYPE);
            } else {
                part.push(protocol::LONG_TYPE);
            }
            part.push_str(&n.to_string());
        }
        Value::Double(d) => {
            part.push(protocol::DOUBLE_TYPE);
            part.push_str(&format_double(*d));
        }
        Value::Decimal(text) => {
            if text.contains('\n') {
                return Err(GatewayError::UnsupportedType(
                    "decimal text must not contain a newline".to_string(),
                ));
            }
            part.push(protocol::DECIMAL_TYPE);
            part.push_str(text);
        }
        Value::Str(s) => {
            part.push(protocol::STRING_TYPE);
            part.push_str(&protocol::escape(s));
        }
        Value::Bytes(bytes) => {
            part.push(protocol::BYTES_TYPE);
            part.push_str(&STANDARD.encode(bytes));
        }
        Value::Object(p) => push_reference(&mut part, p.target_id()),
        Value::List(p) => push_reference(&mut part, p.target_id()),
        Value::Set(p) => push_reference(&mut part, p.target_id()),
        Value::Map(p) => push_reference(&mut part, p.target_id()),
        Value::Array(p) => push_reference(&mut part, p.target_id()),
        Value::Iterator(p) => push_reference(&mut part, p.target_id()),
        Value::Callback(cb) => {
            for iface in &cb.interfaces {
                if iface.contains('\n') || iface.contains(';') {
                    return Err(GatewayError::UnsupportedType(format!(
                        "interface name is not a valid identifier: {iface:?}"
                    )));
                }
            }
            let id = registry.register(cb.object.clone(), cb.interfaces.clone());
            part.push(protocol::CALLBACK_PROXY_TYPE);
            part.push_str(&id);
            part.push(';');
            part.push_str(&cb.interfaces.join(";"));
        }
    }
    part.push('\n');
    Ok(part)
}

fn push_reference(part: &mut String, target_id: &str) {
    part.push(protocol::REFERENCE_TYPE);
    part.push_str(target_id);
}

/// Textual double form the JVM can parse back.
fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d == f64::INFINITY {
        "Infinity".to_string()
    } else if d == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{d:?}")
    }
}

/// Decode a full response line into a value, or the error it reports.
pub fn decode_response(line: &str, client: &GatewayClient) -> Result<Value> {
    let line = line.strip_prefix('!').unwrap_or(line);
    let mut chars = line.chars();
    let code = chars.next().ok_or_else(|| {
        GatewayError::network("empty response from gateway")
    })?;
    let rest = chars.as_str();
    match code {
        protocol::SUCCESS => {
            if rest.is_empty() {
                return Err(GatewayError::Framing(
                    "success response carries no value".to_string(),
                ));
            }
            decode_value(rest, client)
        }
        protocol::ERROR => {
            // Best-effort: the payload is usually a reference to the Java
            // exception object.
            let exception = match decode_value(rest, client) {
                Ok(Value::Object(p)) => Some(p),
                _ => None,
            };
            Err(GatewayError::HostInvocation {
                payload: rest.to_string(),
                exception,
            })
        }
        protocol::FATAL => Err(GatewayError::FatalProtocol(rest.to_string())),
        other => Err(GatewayError::Framing(format!(
            "unknown response code {other:?} in line {line:?}"
        ))),
    }
}

/// Decode a type-tagged value payload.
pub fn decode_value(payload: &str, client: &GatewayClient) -> Result<Value> {
    let mut chars = payload.chars();
    let tag = chars.next().ok_or_else(|| {
        GatewayError::Decode("empty value payload".to_string())
    })?;
    let body = chars.as_str();
    match tag {
        protocol::VOID_TYPE | protocol::NULL_TYPE => Ok(Value::Null),
        protocol::BOOLEAN_TYPE => Ok(Value::Bool(body.eq_ignore_ascii_case("true"))),
        protocol::INT_TYPE => body
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| GatewayError::Decode(format!("bad int payload {body:?}: {e}"))),
        protocol::LONG_TYPE => body
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|e| GatewayError::Decode(format!("bad long payload {body:?}: {e}"))),
        protocol::DOUBLE_TYPE => body
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| GatewayError::Decode(format!("bad double payload {body:?}: {e}"))),
        protocol::DECIMAL_TYPE => Ok(Value::Decimal(body.to_string())),
        protocol::STRING_TYPE => protocol::unescape(body).map(Value::Str),
        protocol::BYTES_TYPE => STANDARD
            .decode(body)
            .map(Value::Bytes)
            .map_err(|e| GatewayError::Decode(format!("bad base64 payload: {e}"))),
        protocol::REFERENCE_TYPE
        | protocol::LIST_TYPE
        | protocol::SET_TYPE
        | protocol::MAP_TYPE
        | protocol::ARRAY_TYPE
        | protocol::ITERATOR_TYPE => Ok(client.wrap(body, tag)),
        protocol::CALLBACK_PROXY_TYPE => Ok(client.lookup_proxy(body)),
        other => Err(GatewayError::Decode(format!(
            "unknown value type tag {other:?}"
        ))),
    }
}
