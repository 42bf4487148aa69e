//! Typed coercion for well-known MPD fields.
//!
//! The grouper emits text values; this module upgrades fields whose
//! normalized key is in the fixed table below to integers, floats or
//! booleans. Coercion is applied explicitly by the caller, scalar or
//! element-wise over accumulated lists, and always falls back to the
//! original text when a value does not parse. Unknown keys pass through
//! unchanged.

use crate::grouper::{Record, Value};

#[derive(Clone, Copy)]
enum FieldKind {
    Integer,
    Float,
    Boolean,
}

/// Fixed table of known normalized keys and their scalar types.
fn field_kind(key: &str) -> Option<FieldKind> {
    match key {
        "volume" | "playlist" | "playlistlength" | "song" | "songid" | "nextsong"
        | "nextsongid" | "bitrate" | "xfade" | "id" | "pos" | "prio" | "track" | "disc"
        | "outputid" | "updating_db" | "artists" | "albums" | "songs" | "uptime"
        | "playtime" | "db_playtime" | "db_update" | "channels" | "size" => {
            Some(FieldKind::Integer)
        }
        "elapsed" | "duration" | "mixrampdb" | "mixrampdelay" => Some(FieldKind::Float),
        "repeat" | "random" | "single" | "consume" | "outputenabled" => Some(FieldKind::Boolean),
        _ => None,
    }
}

/// Coerce a single value in place for the given normalized key.
///
/// Returns true when the value (or any list element) changed type.
pub fn coerce_value(key: &str, value: &mut Value) -> bool {
    let Some(kind) = field_kind(key) else {
        return false;
    };
    apply(kind, value)
}

fn apply(kind: FieldKind, value: &mut Value) -> bool {
    match value {
        Value::Text(text) => {
            let parsed = match kind {
                FieldKind::Integer => text.parse::<i64>().ok().map(Value::Integer),
                FieldKind::Float => text.parse::<f64>().ok().map(Value::Float),
                FieldKind::Boolean => match text.as_str() {
                    "0" => Some(Value::Boolean(false)),
                    "1" => Some(Value::Boolean(true)),
                    _ => None,
                },
            };
            match parsed {
                Some(typed) => {
                    *value = typed;
                    true
                }
                // Unparseable values keep their original text.
                None => false,
            }
        }
        Value::List(items) => {
            let mut changed = false;
            for item in items {
                changed |= apply(kind, item);
            }
            changed
        }
        _ => false,
    }
}

/// Coerce every known field of a record in place, recursing into children.
pub fn coerce_record(record: &mut Record) {
    for (key, value) in record.iter_mut() {
        if let Value::Records(children) = value {
            for child in children {
                coerce_record(child);
            }
            continue;
        }
        coerce_value(key, value);
    }
}
