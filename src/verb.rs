//! HTTP verbs and the pseudo-verbs `use`, `param` and `all`.

use axum::http::Method;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A route verb.
///
/// Covers every method an express-style router accepts, plus the
/// pseudo-verbs `use` (prefix middleware), `param` (parameter
/// preprocessing) and `all` (any method).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Verb {
    All,
    Checkout,
    Connect,
    Copy,
    #[strum(to_string = "delete", serialize = "del")]
    Delete,
    Get,
    Head,
    Lock,
    Merge,
    MkActivity,
    MkCol,
    Move,
    #[strum(serialize = "m-search")]
    MSearch,
    Notify,
    Options,
    Param,
    Patch,
    Post,
    PropFind,
    PropPatch,
    Purge,
    Put,
    Report,
    Search,
    Subscribe,
    Trace,
    Unlock,
    Unsubscribe,
    Use,
}

impl Verb {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// `use`, `param` and `all` are not HTTP methods.
    pub fn is_pseudo(&self) -> bool {
        matches!(self, Verb::Use | Verb::Param | Verb::All)
    }

    /// Whether a request with `method` is served by a route declared with this verb.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Verb::All => true,
            Verb::Use | Verb::Param => false,
            verb => method.as_str().eq_ignore_ascii_case(verb.as_str()),
        }
    }
}
