//! Request and response messages for the remote file service
//!
//! On the wire a message is a flat JSON object. Its kind travels in the
//! `message` field (`"request"` or `"response"`) and a request's operation in
//! the `type` field:
//!
//! ```text
//! {"message":"request","type":"PUT","target":"/a/b.txt","content":"hello"}
//! {"message":"response","code":"201","content":"Ok"}
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const REQUEST_KIND: &str = "request";
pub const RESPONSE_KIND: &str = "response";

/// Request or response that does not have the shape the protocol requires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be a string")]
    InvalidField(&'static str),
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("expected a {expected} message, got `{found}`")]
    UnexpectedKind { expected: &'static str, found: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Get,
    Put,
    Delete,
    Disconnect,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Put => "PUT",
            Operation::Delete => "DELETE",
            Operation::Disconnect => "DISCONNECT",
        }
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Operation::Get),
            "PUT" => Ok(Operation::Put),
            "DELETE" => Ok(Operation::Delete),
            "DISCONNECT" => Ok(Operation::Disconnect),
            other => Err(ProtocolError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A well-formed request. Every operation carries exactly the fields it needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Get { target: String },
    Put { target: String, content: String },
    Delete { target: String },
    Disconnect,
}

impl Request {
    pub fn get(target: impl Into<String>) -> Self {
        Request::Get {
            target: target.into(),
        }
    }

    pub fn put(target: impl Into<String>, content: impl Into<String>) -> Self {
        Request::Put {
            target: target.into(),
            content: content.into(),
        }
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Request::Delete {
            target: target.into(),
        }
    }

    pub fn disconnect() -> Self {
        Request::Disconnect
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::Get { .. } => Operation::Get,
            Request::Put { .. } => Operation::Put,
            Request::Delete { .. } => Operation::Delete,
            Request::Disconnect => Operation::Disconnect,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Request::Get { target } | Request::Put { target, .. } | Request::Delete { target } => {
                Some(target)
            }
            Request::Disconnect => None,
        }
    }

    /// Validate a decoded JSON frame as a request.
    ///
    /// Unknown extra fields are ignored. Missing or mistyped required fields,
    /// an unknown operation, or a kind other than `request` are errors.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let fields = value.as_object().ok_or(ProtocolError::NotAnObject)?;

        let kind = string_field(fields, "message")?;
        if kind != REQUEST_KIND {
            return Err(ProtocolError::UnexpectedKind {
                expected: REQUEST_KIND,
                found: kind.to_string(),
            });
        }

        let request = match string_field(fields, "type")?.parse::<Operation>()? {
            Operation::Get => Request::get(string_field(fields, "target")?),
            Operation::Put => Request::put(
                string_field(fields, "target")?,
                string_field(fields, "content")?,
            ),
            Operation::Delete => Request::delete(string_field(fields, "target")?),
            Operation::Disconnect => Request::Disconnect,
        };
        Ok(request)
    }
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ProtocolError> {
    match fields.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ProtocolError::InvalidField(name)),
        None => Err(ProtocolError::MissingField(name)),
    }
}

#[derive(Serialize)]
struct RequestWire<'a> {
    message: &'static str,
    #[serde(rename = "type")]
    operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let content = match self {
            Request::Put { content, .. } => Some(content.as_str()),
            _ => None,
        };
        RequestWire {
            message: REQUEST_KIND,
            operation: self.operation(),
            target: self.target(),
            content,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Request::from_value(&value).map_err(D::Error::custom)
    }
}

/// Response status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// GET succeeded, content returned.
    Success,
    /// PUT created a new file.
    Created,
    /// PUT overwrote an existing file.
    Modified,
    /// DELETE removed the target.
    Deleted,
    NotFound,
    BadRequest,
    UnknownError,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::Success => 200,
            StatusCode::Created => 201,
            StatusCode::Modified => 202,
            StatusCode::Deleted => 203,
            StatusCode::NotFound => 400,
            StatusCode::BadRequest => 401,
            StatusCode::UnknownError => 402,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Success),
            201 => Some(StatusCode::Created),
            202 => Some(StatusCode::Modified),
            203 => Some(StatusCode::Deleted),
            400 => Some(StatusCode::NotFound),
            401 => Some(StatusCode::BadRequest),
            402 => Some(StatusCode::UnknownError),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self.as_u16() < 400
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

// Codes travel as decimal strings; numbers are accepted when reading.
impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.as_u16())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCode {
            Text(String),
            Number(u16),
        }

        let code = match RawCode::deserialize(deserializer)? {
            RawCode::Text(text) => text.trim().parse::<u16>().map_err(D::Error::custom)?,
            RawCode::Number(n) => n,
        };
        StatusCode::from_u16(code)
            .ok_or_else(|| D::Error::custom(format!("unknown status code {code}")))
    }
}

/// Server reply. Built fresh for every request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResponseWire", try_from = "ResponseWire")]
pub struct Response {
    pub code: StatusCode,
    pub content: String,
}

#[derive(Serialize, Deserialize)]
struct ResponseWire {
    message: String,
    code: StatusCode,
    #[serde(default)]
    content: String,
}

impl From<Response> for ResponseWire {
    fn from(response: Response) -> Self {
        Self {
            message: RESPONSE_KIND.to_string(),
            code: response.code,
            content: response.content,
        }
    }
}

impl TryFrom<ResponseWire> for Response {
    type Error = ProtocolError;

    fn try_from(wire: ResponseWire) -> Result<Self, Self::Error> {
        if wire.message != RESPONSE_KIND {
            return Err(ProtocolError::UnexpectedKind {
                expected: RESPONSE_KIND,
                found: wire.message,
            });
        }
        Ok(Self {
            code: wire.code,
            content: wire.content,
        })
    }
}

impl Response {
    pub fn new(code: StatusCode, content: impl Into<String>) -> Self {
        Self {
            code,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(StatusCode::Success, content)
    }

    pub fn created() -> Self {
        Self::new(StatusCode::Created, "Ok")
    }

    pub fn modified() -> Self {
        Self::new(StatusCode::Modified, "Modified")
    }

    pub fn deleted() -> Self {
        Self::new(StatusCode::Deleted, "Ok")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound, "Not Found")
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest, "Bad Request")
    }

    pub fn unknown_error() -> Self {
        Self::new(StatusCode::UnknownError, "Unknown Error")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let put = serde_json::to_value(Request::put("/a/b.txt", "hi")).unwrap();
        assert_eq!(
            put,
            json!({"message": "request", "type": "PUT", "target": "/a/b.txt", "content": "hi"})
        );

        let disconnect = serde_json::to_value(Request::disconnect()).unwrap();
        assert_eq!(disconnect, json!({"message": "request", "type": "DISCONNECT"}));
    }

    #[test]
    fn test_response_code_is_a_string_on_the_wire() {
        let text = serde_json::to_string(&Response::not_found()).unwrap();
        assert_eq!(text, r#"{"message":"response","code":"400","content":"Not Found"}"#);
    }

    #[test]
    fn test_response_accepts_numeric_code() {
        let response: Response =
            serde_json::from_str(r#"{"message":"response","code":203,"content":"Ok"}"#).unwrap();
        assert_eq!(response, Response::deleted());
    }

    #[test]
    fn test_response_rejects_request_kind() {
        let err = serde_json::from_str::<Response>(
            r#"{"message":"request","code":"200","content":"x"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_get_without_target() {
        let value = json!({"message": "request", "type": "GET"});
        assert_eq!(
            Request::from_value(&value),
            Err(ProtocolError::MissingField("target"))
        );
    }

    #[test]
    fn test_put_without_content() {
        let value = json!({"message": "request", "type": "PUT", "target": "/a.txt"});
        assert_eq!(
            Request::from_value(&value),
            Err(ProtocolError::MissingField("content"))
        );
    }

    #[test]
    fn test_wrong_kind_and_operation() {
        let value = json!({"message": "response", "type": "GET", "target": "/a.txt"});
        assert!(matches!(
            Request::from_value(&value),
            Err(ProtocolError::UnexpectedKind { .. })
        ));

        let value = json!({"message": "request", "type": "LIST"});
        assert_eq!(
            Request::from_value(&value),
            Err(ProtocolError::UnknownOperation("LIST".to_string()))
        );

        let value = json!({"message": "request", "type": "GET", "target": 7});
        assert_eq!(
            Request::from_value(&value),
            Err(ProtocolError::InvalidField("target"))
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let value = json!({"message": "request", "type": "DELETE", "target": "/a/", "extra": true});
        assert_eq!(Request::from_value(&value), Ok(Request::delete("/a/")));
    }
}
