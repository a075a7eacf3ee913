//! XML-RPC document encoding and decoding
//!
//! Standard XML-RPC has no null value. The Gandi API uses the `<nil/>`
//! extension for absent optional fields in both directions, so support for it
//! is switched on explicitly through [`CodecOptions`].

use crate::value::Value;
use gandi_core::{GandiError, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Codec behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecOptions {
    /// Accept `<nil/>` in decoded documents
    pub decode_nil: bool,
    /// Emit `<nil/>` for `Value::Nil` instead of failing
    pub encode_nil: bool,
}

impl CodecOptions {
    /// Plain XML-RPC: nil is rejected both ways
    pub fn strict() -> Self {
        Self::default()
    }

    /// Accept and emit the `<nil/>` extension
    pub fn nil_tolerant() -> Self {
        Self {
            decode_nil: true,
            encode_nil: true,
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a `methodCall` document.
///
/// # Errors
///
/// Fails on nil when `encode_nil` is off, and on integers outside the i32
/// range XML-RPC allows.
pub fn encode_call(method: &str, params: &[Value], options: CodecOptions) -> Result<String> {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param, options)?;
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    Ok(out)
}

/// Encode a successful `methodResponse` document.
pub fn encode_response(value: &Value, options: CodecOptions) -> Result<String> {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse><params><param>");
    encode_value(&mut out, value, options)?;
    out.push_str("</param></params></methodResponse>");
    Ok(out)
}

/// Encode a fault `methodResponse` document.
pub fn encode_fault(code: i64, message: &str) -> Result<String> {
    let mut members = BTreeMap::new();
    members.insert("faultCode".to_string(), Value::Int(code));
    members.insert("faultString".to_string(), Value::String(message.to_string()));

    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse><fault>");
    encode_value(&mut out, &Value::Struct(members), CodecOptions::strict())?;
    out.push_str("</fault></methodResponse>");
    Ok(out)
}

fn encode_value(out: &mut String, value: &Value, options: CodecOptions) -> Result<()> {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            let i = i32::try_from(*i)
                .map_err(|_| GandiError::Codec(format!("Integer {} does not fit in i4", i)))?;
            // Writing into a String cannot fail
            let _ = write!(out, "<int>{}</int>", i);
        }
        Value::Bool(b) => {
            out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Double(d) => {
            if !d.is_finite() {
                return Err(GandiError::Codec(format!("Non-finite double: {}", d)));
            }
            let _ = write!(out, "<double>{}</double>", d);
        }
        Value::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</dateTime.iso8601>");
        }
        Value::Base64(s) => {
            out.push_str("<base64>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item, options)?;
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(out, member, options)?;
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => {
            if !options.encode_nil {
                return Err(GandiError::Codec(
                    "nil value is not allowed (enable encode_nil)".to_string(),
                ));
            }
            out.push_str("<nil/>");
        }
    }
    out.push_str("</value>");
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Minimal element tree built from the event stream
#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(raw_name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(raw_name).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require_child(&self, name: &str) -> Result<&Element> {
        self.child(name).ok_or_else(|| {
            GandiError::Codec(format!("<{}> is missing its <{}> element", self.name, name))
        })
    }
}

fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            GandiError::Codec(format!(
                "Malformed XML at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => stack.push(Element::new(e.name().as_ref())),
            Event::Empty(e) => {
                let element = Element::new(e.name().as_ref());
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| GandiError::Codec("Unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| GandiError::Codec(format!("Bad text content: {}", e)))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(GandiError::Codec("Unexpected end of document".to_string()));
    }
    root.ok_or_else(|| GandiError::Codec("Empty document".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(GandiError::Codec("Multiple root elements".to_string())),
    }
    Ok(())
}

/// Decode a `methodResponse` document.
///
/// # Errors
///
/// A `<fault>` response becomes [`GandiError::RemoteFault`]; malformed
/// documents and unexpected nils become [`GandiError::Codec`].
pub fn decode_response(xml: &str, options: CodecOptions) -> Result<Value> {
    let root = parse_document(xml)?;
    if root.name != "methodResponse" {
        return Err(GandiError::Codec(format!(
            "Expected <methodResponse>, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let fault = decode_value(fault.require_child("value")?, options)?;
        let code = fault.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
        let message = fault
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or("unknown fault")
            .to_string();
        return Err(GandiError::RemoteFault { code, message });
    }

    let value = root
        .require_child("params")?
        .require_child("param")?
        .require_child("value")?;
    decode_value(value, options)
}

/// Decode a `methodCall` document into its method name and parameters.
pub fn decode_call(xml: &str, options: CodecOptions) -> Result<(String, Vec<Value>)> {
    let root = parse_document(xml)?;
    if root.name != "methodCall" {
        return Err(GandiError::Codec(format!(
            "Expected <methodCall>, got <{}>",
            root.name
        )));
    }

    let method = root.require_child("methodName")?.text.trim().to_string();
    let params = match root.child("params") {
        Some(params) => params
            .children
            .iter()
            .filter(|c| c.name == "param")
            .map(|param| decode_value(param.require_child("value")?, options))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok((method, params))
}

fn decode_value(element: &Element, options: CodecOptions) -> Result<Value> {
    // An untyped <value> is a string
    let typed = match element.children.as_slice() {
        [] => return Ok(Value::String(element.text.clone())),
        [typed] => typed,
        _ => {
            return Err(GandiError::Codec(
                "<value> holds more than one element".to_string(),
            ))
        }
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| GandiError::Codec(format!("Bad integer '{}'", text))),
        "boolean" => match text {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(GandiError::Codec(format!("Bad boolean '{}'", other))),
        },
        "string" => Ok(Value::String(typed.text.clone())),
        "double" => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| GandiError::Codec(format!("Bad double '{}'", text))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.to_string())),
        "base64" => Ok(Value::Base64(text.to_string())),
        "nil" => {
            if options.decode_nil {
                Ok(Value::Nil)
            } else {
                Err(GandiError::Codec(
                    "nil value is not allowed (enable decode_nil)".to_string(),
                ))
            }
        }
        "array" => {
            let items = match typed.child("data") {
                Some(data) => data
                    .children
                    .iter()
                    .filter(|c| c.name == "value")
                    .map(|v| decode_value(v, options))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.require_child("name")?.text.clone();
                let value = decode_value(member.require_child("value")?, options)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(GandiError::Codec(format!("Unknown value type <{}>", other))),
    }
}
