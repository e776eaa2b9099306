//! Text records exchanged with the simulator.
//!
//! Every record is `$TYPE` followed by zero or more comma-separated
//! parameters, e.g. `$SET,delay,10` or `$RESP,4`.

use std::fmt;

use crate::error::{Error, Result};

/// Record marker that starts every message.
pub const MARKER: char = '$';
/// Separator between the type and each parameter.
pub const SEPARATOR: char = ',';

/// Reply type the simulator uses to acknowledge a command.
pub const RESP: &str = "RESP";

/// One protocol record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Record type, without the `$` marker.
    pub kind: String,
    /// Parameters in wire order.
    pub params: Vec<String>,
}

impl Message {
    /// Create a record.
    pub fn new<K, I, S>(kind: K, params: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// A record with no parameters.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    /// A `$RESP` reply with the given parameters.
    pub fn resp<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RESP, params)
    }

    /// Check if this is a `$RESP` acknowledgement.
    #[must_use]
    pub fn is_resp(&self) -> bool {
        self.kind == RESP
    }

    /// Render to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the type is empty or any field
    /// contains the separator, which would corrupt the record.
    pub fn encode(&self) -> Result<String> {
        if self.kind.is_empty() {
            return Err(Error::InvalidArgument("empty message type".into()));
        }
        if let Some(field) = std::iter::once(&self.kind)
            .chain(&self.params)
            .find(|field| field.contains(SEPARATOR))
        {
            return Err(Error::InvalidArgument(format!(
                "field {field:?} contains {SEPARATOR:?}"
            )));
        }
        Ok(self.to_string())
    }

    /// Parse wire text. Surrounding whitespace (such as a line terminator) is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the record lacks the `$` marker or a type.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let body = text
            .strip_prefix(MARKER)
            .ok_or_else(|| Error::Protocol(format!("record {text:?} does not start with '$'")))?;
        let mut fields = body.split(SEPARATOR);
        let kind = fields.next().unwrap_or_default();
        if kind.is_empty() {
            return Err(Error::Protocol(format!("record {text:?} has no type")));
        }
        Ok(Self::new(kind, fields))
    }

    /// Parse a received payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload is not UTF-8 or not a record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Protocol(format!("record is not UTF-8: {e}")))?;
        Self::parse(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MARKER}{}", self.kind)?;
        for param in &self.params {
            write!(f, "{SEPARATOR}{param}")?;
        }
        Ok(())
    }
}
