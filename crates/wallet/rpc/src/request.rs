use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A JSON-RPC request object, a method call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcMethodCall {
    /// The version of the protocol
    pub jsonrpc: Version,
    /// The name of the method to execute
    pub method: String,
    /// An array or object containing the parameters to be passed to the function.
    #[serde(default = "no_params")]
    pub params: RequestParams,
    /// The identifier for this request issued by the client,
    /// An [Id] must be a String, null or a number.
    /// If missing it's considered a notification in [Version::V2]
    pub id: Id,
}

impl RpcMethodCall {
    /// Creates a new [Version::V2] method call.
    pub fn new(method: impl Into<String>, params: impl Into<RequestParams>, id: impl Into<Id>) -> Self {
        Self { jsonrpc: Version::V2, method: method.into(), params: params.into(), id: id.into() }
    }

    pub fn id(&self) -> Id {
        self.id.clone()
    }
}

/// Represents a JSON-RPC request which is considered a notification (missing [Id] optional
/// [Version])
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcNotification {
    pub jsonrpc: Option<Version>,
    pub method: String,
    #[serde(default = "no_params")]
    pub params: RequestParams,
}

/// Representation of a single JSON-RPC call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcCall {
    /// the RPC method to invoke
    MethodCall(RpcMethodCall),
    /// A notification (no [Id] provided)
    Notification(RpcNotification),
    /// Invalid call
    Invalid {
        /// id or [Id::Null]
        #[serde(default = "null_id")]
        id: Id,
    },
}

/// Represents a JSON-RPC request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(untagged)]
pub enum Request {
    /// single json rpc request [RpcCall]
    Single(RpcCall),
    /// batch of several requests
    Batch(Vec<RpcCall>),
}

/// Request parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum RequestParams {
    /// no parameters provided
    #[default]
    None,
    /// An array of JSON values
    Array(Vec<serde_json::Value>),
    /// a map of JSON values
    Object(serde_json::Map<String, serde_json::Value>),
}

impl RequestParams {
    /// Returns the positional parameters, an empty slice if none were provided.
    ///
    /// Object parameters are treated as a single positional argument by callers that need
    /// positional access, see [`RequestParams::get`].
    pub fn as_array(&self) -> &[serde_json::Value] {
        match self {
            Self::Array(params) => params,
            Self::None | Self::Object(_) => &[],
        }
    }

    /// Returns the positional parameter at `index`.
    pub fn get(&self, index: usize) -> Option<&serde_json::Value> {
        self.as_array().get(index)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Array(params) => params.is_empty(),
            Self::Object(params) => params.is_empty(),
        }
    }
}

impl Serialize for RequestParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // nodes disagree on how to treat a missing `params` member, an empty array is
            // accepted everywhere
            Self::None => serializer.collect_seq(std::iter::empty::<serde_json::Value>()),
            Self::Array(params) => params.serialize(serializer),
            Self::Object(params) => params.serialize(serializer),
        }
    }
}

impl From<RequestParams> for serde_json::Value {
    fn from(params: RequestParams) -> Self {
        match params {
            RequestParams::None => Self::Array(Vec::new()),
            RequestParams::Array(arr) => arr.into(),
            RequestParams::Object(obj) => obj.into(),
        }
    }
}

impl From<Vec<serde_json::Value>> for RequestParams {
    fn from(params: Vec<serde_json::Value>) -> Self {
        Self::Array(params)
    }
}

impl From<()> for RequestParams {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<Option<Vec<serde_json::Value>>> for RequestParams {
    fn from(params: Option<Vec<serde_json::Value>>) -> Self {
        params.map(Self::Array).unwrap_or_default()
    }
}

fn no_params() -> RequestParams {
    RequestParams::None
}

/// Represents the version of the RPC protocol
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    String(String),
    Number(i64),
    Null,
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => s.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<u64> for Id {
    fn from(id: u64) -> Self {
        i64::try_from(id).map(Self::Number).unwrap_or_else(|_| Self::String(id.to_string()))
    }
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

fn null_id() -> Id {
    Id::Null
}
