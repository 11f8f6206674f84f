//! HTTP method as a typed enum.
//!
//! Only the methods a route can be registered under are represented.
//! Anything else is answered by the router before it reaches a handler.

use std::fmt;

/// A method the router can register a handler for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl Method {
    /// Every variant, in a stable order. Used when probing other trees for a 405.
    pub(crate) const ALL: [Method; 7] = [
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
        }
    }

    /// Maps hyper's method type onto ours. `None` for methods we never route.
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::DELETE  => Some(Self::Delete),
            http::Method::GET     => Some(Self::Get),
            http::Method::HEAD    => Some(Self::Head),
            http::Method::OPTIONS => Some(Self::Options),
            http::Method::PATCH   => Some(Self::Patch),
            http::Method::POST    => Some(Self::Post),
            http::Method::PUT     => Some(Self::Put),
            _                     => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_routable_http_methods() {
        assert_eq!(Method::from_http(&http::Method::PUT), Some(Method::Put));
        assert_eq!(Method::from_http(&http::Method::DELETE), Some(Method::Delete));
        assert_eq!(Method::from_http(&http::Method::TRACE), None);
    }

    #[test]
    fn displays_wire_name() {
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
