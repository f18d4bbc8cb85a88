//! Engine.IO v4 / Socket.IO v5 text frame codec.
//!
//! Only the text subset is handled: binary attachments never appear on
//! the Galileo event channel.
//!
//! ```text
//! 0{"sid":..}            engine open
//! 2 / 3                  ping / pong
//! 40/ns,{..}             namespace connect (ack)
//! 41/ns,                 namespace disconnect
//! 42/ns,12["name",..]    event, optional ack id
//! 44/ns,{"message":..}   namespace connect error
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Handshake body of the engine `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// Socket.IO packet carried inside an engine `message`.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

/// One engine-level frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

impl Packet {
    pub fn parse(frame: &str) -> Result<Self, Error> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or_else(|| malformed(frame, "empty frame"))?;
        let rest = chars.as_str();

        match kind {
            '0' => serde_json::from_str(rest)
                .map(Packet::Open)
                .map_err(|e| malformed(frame, &e.to_string())),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => SocketPacket::parse(rest).map(Packet::Message),
            '5' => Ok(Packet::Upgrade),
            '6' => Ok(Packet::Noop),
            _ => Err(malformed(frame, "unknown engine packet type")),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".into(),
            Self::Close => "1".into(),
            Self::Ping => "2".into(),
            Self::Pong => "3".into(),
            Self::Message(packet) => format!("4{}", packet.encode()),
            Self::Upgrade => "5".into(),
            Self::Noop => "6".into(),
        }
    }
}

impl SocketPacket {
    fn parse(body: &str) -> Result<Self, Error> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or_else(|| malformed(body, "empty socket packet"))?;
        let rest = chars.as_str();

        let (namespace, rest) = match rest.strip_prefix('/') {
            Some(_) => match rest.split_once(',') {
                Some((ns, tail)) => (ns.to_owned(), tail),
                None => (rest.to_owned(), ""),
            },
            None => ("/".to_owned(), rest),
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack_digits, payload) = rest.split_at(digits);
        let ack = if ack_digits.is_empty() {
            None
        } else {
            Some(
                ack_digits
                    .parse::<u64>()
                    .map_err(|e| malformed(body, &e.to_string()))?,
            )
        };

        let data: Option<Value> = if payload.is_empty() {
            None
        } else {
            Some(serde_json::from_str(payload).map_err(|e| malformed(body, &e.to_string()))?)
        };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(malformed(body, "event payload is not an array"));
                };
                if items.is_empty() {
                    return Err(malformed(body, "event without a name"));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(malformed(body, "event name is not a string"));
                };
                Ok(Self::Event {
                    namespace,
                    ack,
                    name,
                    args: items,
                })
            }
            '3' => {
                let ack = ack.ok_or_else(|| malformed(body, "ack without id"))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                Ok(Self::Ack {
                    namespace,
                    ack,
                    args,
                })
            }
            '4' => Ok(Self::ConnectError {
                namespace,
                data: data.unwrap_or(Value::Null),
            }),
            _ => Err(malformed(body, "unsupported socket packet type")),
        }
    }

    fn encode(&self) -> String {
        match self {
            Self::Connect { namespace, data } => {
                let data = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{data}", ns_prefix(namespace))
            }
            Self::Disconnect { namespace } => format!("1{}", ns_prefix(namespace)),
            Self::Event {
                namespace,
                ack,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let ack = ack.map(|id| id.to_string()).unwrap_or_default();
                format!("2{}{ack}{}", ns_prefix(namespace), Value::Array(items))
            }
            Self::Ack {
                namespace,
                ack,
                args,
            } => format!("3{}{ack}{}", ns_prefix(namespace), Value::Array(args.clone())),
            Self::ConnectError { namespace, data } => format!("4{}{data}", ns_prefix(namespace)),
        }
    }

    /// Human-readable reason carried by a connect error.
    pub fn error_message(data: &Value) -> String {
        match data {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| data.to_string(), str::to_owned),
            other => other.to_string(),
        }
    }
}

/// The default namespace is implicit on the wire.
fn ns_prefix(namespace: &str) -> String {
    if namespace == "/" {
        String::new()
    } else {
        format!("{namespace},")
    }
}

fn malformed(frame: &str, reason: &str) -> Error {
    let preview: String = frame.chars().take(80).collect();
    Error::SocketIo {
        message: format!("malformed frame {preview:?}: {reason}"),
    }
}
