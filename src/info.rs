//! Parsing of administrative info responses
//!
//! Info responses are text: entries separated by `;`, each entry a list of
//! `key=value` fields. `sets` entries separate fields with `:`
//!
//! ```text
//! ns_name=test:set_name=tweets:n_objects=68763:set-stop-write-count=0;
//! ns=test:set=demo:objects=12:tombstones=0:memory_data_bytes=0;
//! ```
//!
//! and `udf-list` entries separate them with `,`
//!
//! ```text
//! filename=redis.lua,hash=1b2c...,type=LUA;
//! ```

/// Info command listing per-set statistics
pub const SETS_COMMAND: &str = "sets";

/// Info command listing registered procedure modules
pub const UDF_LIST_COMMAND: &str = "udf-list";

/// Iterate the `key=value` fields of one entry
fn fields(entry: &str, separator: char) -> impl Iterator<Item = (&str, &str)> {
    entry
        .split(separator)
        .filter_map(|field| field.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
}

/// Sum the object counts reported for `namespace`/`set` in a `sets` response
///
/// Both the legacy (`ns_name`, `set_name`, `n_objects`) and current
/// (`ns`, `set`, `objects`) field names are recognized. Entries for other
/// sets and malformed counts are ignored.
pub fn set_object_count(response: &str, namespace: &str, set: &str) -> u64 {
    let mut total = 0;
    for entry in response.split(';').filter(|e| !e.trim().is_empty()) {
        let mut ns_match = false;
        let mut set_match = false;
        let mut objects = None;
        for (key, value) in fields(entry, ':') {
            match key {
                "ns" | "ns_name" => ns_match = value == namespace,
                "set" | "set_name" => set_match = value == set,
                "objects" | "n_objects" => objects = value.parse::<u64>().ok(),
                _ => {}
            }
        }
        if ns_match && set_match {
            total += objects.unwrap_or(0);
        }
    }
    total
}

/// Whether a `udf-list` response contains a module registered as `filename`
pub fn module_registered(response: &str, filename: &str) -> bool {
    response
        .split(';')
        .any(|entry| fields(entry, ',').any(|(k, v)| k == "filename" && v == filename))
}
