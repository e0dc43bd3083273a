//! InfluxDB line protocol encoding.
//!
//! ```text
//! <measurement>[,<tag>=<value>...] <field>=<value>[,<field>=<value>...] [<timestamp ns>]
//! ```

use metflux_types::{BatchPoints, FieldValue, Point};
use std::fmt::Write;

/// Append every point of `batch` to `buffer`, one line each.  Returns the
/// number of lines written.
///
/// Points without any encodable field are skipped; the store would reject
/// them and, with them, the rest of the batch.
pub fn encode_batch(batch: &BatchPoints, buffer: &mut String) -> usize {
    let mut lines = 0;
    for point in &batch.points {
        if encode_point(point, buffer) {
            lines += 1;
        } else {
            tracing::debug!(
                "skipping point '{}': it has no encodable fields",
                point.measurement
            );
        }
    }
    lines
}

/// Append `point` as a single line.  Returns `false` and leaves `buffer`
/// unchanged if the point has no encodable field.
pub fn encode_point(point: &Point, buffer: &mut String) -> bool {
    let start = buffer.len();

    escape(&point.measurement, MEASUREMENT, buffer);
    for (key, value) in point.tags.iter() {
        // Empty tag values are not allowed.
        if key.is_empty() || value.is_empty() {
            continue;
        }
        buffer.push(',');
        escape(key, KEY, buffer);
        buffer.push('=');
        escape(value, KEY, buffer);
    }

    let mut separator = ' ';
    for (key, value) in &point.fields {
        if let FieldValue::Float(f) = value {
            if !f.is_finite() {
                continue;
            }
        }
        buffer.push(separator);
        separator = ',';
        escape(key, KEY, buffer);
        buffer.push('=');
        encode_field_value(value, buffer);
    }

    if separator == ' ' {
        buffer.truncate(start);
        return false;
    }

    if let Some(nanos) = point.time.and_then(|time| time.timestamp_nanos_opt()) {
        let _ = write!(buffer, " {nanos}");
    }
    buffer.push('\n');
    true
}

fn encode_field_value(value: &FieldValue, buffer: &mut String) {
    match value {
        FieldValue::Integer(i) => {
            let _ = write!(buffer, "{i}i");
        }
        FieldValue::Float(f) => {
            let _ = write!(buffer, "{f}");
        }
        FieldValue::Boolean(b) => {
            let _ = write!(buffer, "{b}");
        }
        FieldValue::String(s) => {
            buffer.push('"');
            escape(s, STRING_VALUE, buffer);
            buffer.push('"');
        }
    }
}

const MEASUREMENT: &[char] = &[',', ' ', '\\'];
const KEY: &[char] = &[',', '=', ' ', '\\'];
const STRING_VALUE: &[char] = &['"', '\\'];

/// Line breaks would end the line early, so they are always written as
/// `\n` and `\r`.
fn escape(s: &str, special: &[char], buffer: &mut String) {
    for c in s.chars() {
        match c {
            '\n' => buffer.push_str("\\n"),
            '\r' => buffer.push_str("\\r"),
            c => {
                if special.contains(&c) {
                    buffer.push('\\');
                }
                buffer.push(c);
            }
        }
    }
}
