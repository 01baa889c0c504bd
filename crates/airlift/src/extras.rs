use serde_json::{Map, Number, Value};

/// Marker that tags a CLI argument as an extra manifest value.
const EXTRA_MARKER: &str = "--extra.";

/// Collects `--extra.<dotted.path>=<value>` arguments into a nested object
/// attached verbatim to the release manifest.
///
/// Arguments without the marker or without a `=` are ignored. Dotted key
/// paths become nested objects; a later flag overwrites an earlier value at
/// the same path.
pub(crate) fn parse_extra_args(args: &[String]) -> Map<String, Value> {
    let mut extras = Map::new();

    for arg in args {
        let Some(tail) = arg.strip_prefix(EXTRA_MARKER) else {
            continue;
        };
        let Some((path, raw)) = tail.split_once('=') else {
            continue;
        };

        insert_extra(&mut extras, path, raw);
    }

    extras
}

/// Folds over the dot-separated segments of `path`, building intermediate
/// objects as needed, and stores the coerced value at the leaf.
fn insert_extra(extras: &mut Map<String, Value>, path: &str, raw: &str) {
    let mut segments = path.split('.');
    // `split` yields at least one segment, even for an empty path.
    let Some(mut key) = segments.next() else {
        return;
    };

    let mut current = extras;

    for next in segments {
        let slot = current
            .entry(key.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));

        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }

        let Value::Object(inner) = slot else {
            unreachable!()
        };
        current = inner;
        key = next;
    }

    current.insert(key.to_owned(), coerce_extra_value(raw));
}

/// Coerces a raw extra value into a scalar.
///
/// Numbers are accepted only when their canonical rendering round-trips to
/// the input, so values like `007` or `1.50` stay strings. `true`/`false`
/// match case-insensitively. Everything else stays a string.
fn coerce_extra_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        if int.to_string() == raw {
            return Value::Number(Number::from(int));
        }
    }

    if let Ok(float) = raw.parse::<f64>() {
        if float.to_string() == raw {
            if let Some(number) = Number::from_f64(float) {
                return Value::Number(number);
            }
        }
    }

    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_owned()),
    }
}
