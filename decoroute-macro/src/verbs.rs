// Keep in sync with decoroute::Verb.
const VERBS: &[(&str, &str)] = &[
    ("all", "All"),
    ("checkout", "Checkout"),
    ("connect", "Connect"),
    ("copy", "Copy"),
    ("del", "Delete"),
    ("delete", "Delete"),
    ("get", "Get"),
    ("head", "Head"),
    ("lock", "Lock"),
    ("merge", "Merge"),
    ("mkactivity", "MkActivity"),
    ("mkcol", "MkCol"),
    ("move", "Move"),
    ("m-search", "MSearch"),
    ("notify", "Notify"),
    ("options", "Options"),
    ("patch", "Patch"),
    ("post", "Post"),
    ("propfind", "PropFind"),
    ("proppatch", "PropPatch"),
    ("purge", "Purge"),
    ("put", "Put"),
    ("report", "Report"),
    ("search", "Search"),
    ("subscribe", "Subscribe"),
    ("trace", "Trace"),
    ("unlock", "Unlock"),
    ("unsubscribe", "Unsubscribe"),
    ("use", "Use"),
];

/// Attributes that are shorthand for a verb.
pub const SHORTHANDS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "del", "options", "head", "all",
];

/// The `Verb` variant for `name`, ignoring ASCII case.
///
/// `param` is not accepted; parameter handlers use `#[param]`.
pub fn variant(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    VERBS
        .iter()
        .find(|(verb, _)| *verb == name)
        .map(|(_, variant)| *variant)
}
