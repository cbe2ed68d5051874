//! Fixed-column field decoding.
//!
//! FVS reports are printed with fixed column widths. A [`FieldSpec`] names a
//! field and its 1-based inclusive column range; [`decode_line`] slices a line
//! by every spec in a schema, trims each slice and converts it to the declared
//! [`ValueType`].

use thiserror::Error;

/// Declared type of a fixed-column field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Text,
}

/// One entry of a report schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// First column, 1-based
    pub start: usize,
    /// Last column, 1-based and inclusive
    pub end: usize,
    pub kind: ValueType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, start: usize, end: usize, kind: ValueType) -> Self {
        Self {
            name,
            start,
            end,
            kind,
        }
    }

    /// Column width of the field
    pub fn width(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Raw text under this field's columns, before trimming.
    ///
    /// Columns beyond the end of the line read as empty, matching how the
    /// report writer drops trailing blanks.
    pub fn slice<'a>(&self, line: &'a str) -> Option<&'a str> {
        let from = (self.start - 1).min(line.len());
        let to = self.end.min(line.len());
        line.get(from..to)
    }
}

/// A decoded scalar
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// A slice that could not be converted to its declared type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}' cannot be decoded from '{raw}'")]
pub struct FieldDecodeError {
    pub field: &'static str,
    pub raw: String,
}

/// Field values of one decoded line, in schema order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedLine {
    values: Vec<(&'static str, FieldValue)>,
}

impl DecodedLine {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Integer value of `name`; `None` when absent or not an integer field
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value of `name`; integer fields widen to float
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Text(_) => None,
        }
    }

    /// Like [`DecodedLine::int`], failing when the schema lacks `name`
    pub fn require_int(&self, name: &'static str) -> Result<i64, FieldDecodeError> {
        self.int(name).ok_or_else(|| FieldDecodeError {
            field: name,
            raw: String::new(),
        })
    }

    /// Like [`DecodedLine::float`], failing when the schema lacks `name`
    pub fn require_float(&self, name: &'static str) -> Result<f64, FieldDecodeError> {
        self.float(name).ok_or_else(|| FieldDecodeError {
            field: name,
            raw: String::new(),
        })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decode `line` against `fields`.
///
/// Fails on the first field whose trimmed slice does not parse as its
/// declared type. Text fields never fail.
pub fn decode_line(line: &str, fields: &[FieldSpec]) -> Result<DecodedLine, FieldDecodeError> {
    let mut values = Vec::with_capacity(fields.len());
    for spec in fields {
        let raw = spec.slice(line).ok_or_else(|| FieldDecodeError {
            field: spec.name,
            raw: line.to_string(),
        })?;
        values.push((spec.name, decode_value(spec, raw)?));
    }
    Ok(DecodedLine { values })
}

/// Convert one raw slice to the type declared by `spec`
pub fn decode_value(spec: &FieldSpec, raw: &str) -> Result<FieldValue, FieldDecodeError> {
    let trimmed = raw.trim();
    let fail = || FieldDecodeError {
        field: spec.name,
        raw: raw.to_string(),
    };

    match spec.kind {
        ValueType::Int => trimmed.parse::<i64>().map(FieldValue::Int).map_err(|_| fail()),
        ValueType::Float => trimmed
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| fail()),
        ValueType::Text => Ok(FieldValue::Text(trimmed.to_string())),
    }
}

/// Render `value` back into the columns of `spec`.
///
/// Numbers are right-aligned and text left-aligned. Values wider than the
/// field are returned unpadded.
pub fn encode_field(value: &FieldValue, spec: &FieldSpec) -> String {
    let width = spec.width();
    match value {
        FieldValue::Int(v) => format!("{:>width$}", v),
        FieldValue::Float(v) => format!("{:>width$}", v),
        FieldValue::Text(v) => format!("{:<width$}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CARBON_LAYOUT, HARVESTED_CARBON_LAYOUT, SUMMARY_LAYOUT};
    use proptest::prelude::*;

    const SCHEMA: &[FieldSpec] = &[
        FieldSpec::new("year", 1, 4, ValueType::Int),
        FieldSpec::new("agl", 5, 13, ValueType::Float),
        FieldSpec::new("label", 14, 20, ValueType::Text),
    ];

    #[test]
    fn test_decode_line_types() {
        let line = "2020    123.4  pine ";
        let decoded = decode_line(line, SCHEMA).unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.int("year"), Some(2020));
        assert_eq!(decoded.float("agl"), Some(123.4));
        assert_eq!(decoded.text("label"), Some("pine"));
        assert_eq!(decoded.float("year"), Some(2020.0));
        assert_eq!(decoded.int("agl"), None);
        assert_eq!(decoded.get("missing"), None);
    }

    #[test]
    fn test_decode_failure_names_field_and_slice() {
        let line = "20x0    123.4";
        let err = decode_line(line, SCHEMA).unwrap_err();
        assert_eq!(err.field, "year");
        assert_eq!(err.raw, "20x0");
    }

    #[test]
    fn test_short_line_reads_empty_columns() {
        // The float field is cut off entirely, so it must fail rather than default
        let err = decode_line("2020", SCHEMA).unwrap_err();
        assert_eq!(err.field, "agl");
        assert_eq!(err.raw, "");

        let text_only = [FieldSpec::new("label", 14, 20, ValueType::Text)];
        let decoded = decode_line("2020", &text_only).unwrap();
        assert_eq!(decoded.text("label"), Some(""));
    }

    #[test]
    fn test_partial_trailing_field() {
        let spec = FieldSpec::new("agl", 5, 13, ValueType::Float);
        assert_eq!(spec.slice("2020  12.5"), Some("  12.5"));
        assert_eq!(
            decode_value(&spec, "  12.5").unwrap(),
            FieldValue::Float(12.5)
        );
    }

    /// Render one value per field into its columns, filling the gap columns
    /// between fields with `#`
    fn render_line(fields: &[FieldSpec], seeds: &[u32]) -> String {
        let width = fields.iter().map(|spec| spec.end).max().unwrap_or(0);
        let mut line = vec![b'#'; width];
        for (spec, seed) in fields.iter().zip(seeds) {
            let value = match spec.kind {
                ValueType::Int => {
                    FieldValue::Int(i64::from(*seed) % 10i64.pow(spec.width() as u32 - 1))
                }
                ValueType::Float => FieldValue::Float(f64::from(*seed % 100_000) / 10.0),
                ValueType::Text => FieldValue::Text("X".to_string()),
            };
            line[spec.start - 1..spec.end].copy_from_slice(encode_field(&value, spec).as_bytes());
        }
        String::from_utf8(line).unwrap()
    }

    #[test]
    fn test_encode_field_padding() {
        let int_spec = FieldSpec::new("age", 5, 8, ValueType::Int);
        let text_spec = FieldSpec::new("code", 1, 6, ValueType::Text);

        assert_eq!(encode_field(&FieldValue::Int(45), &int_spec), "  45");
        assert_eq!(
            encode_field(&FieldValue::Text("AB".to_string()), &text_spec),
            "AB    "
        );
    }

    proptest! {
        #[test]
        fn prop_decode_then_encode_reproduces_slice(
            year in 1000i64..9999,
            agl in 0u32..99_999,
            label in "[A-Z]{0,7}",
        ) {
            let agl = agl as f64 / 10.0;
            let line = format!("{:>4}{:>9}{:<7}", year, agl, label);
            let decoded = decode_line(&line, SCHEMA).unwrap();

            for spec in SCHEMA {
                let value = decoded.get(spec.name).unwrap();
                let encoded = encode_field(value, spec);
                let original = spec.slice(&line).unwrap();
                prop_assert_eq!(encoded.trim(), original.trim());
                prop_assert_eq!(encoded.len(), spec.width());
            }
        }

        #[test]
        fn prop_report_layouts_round_trip_through_gap_columns(
            seeds in prop::collection::vec(any::<u32>(), 16),
        ) {
            for layout in [&CARBON_LAYOUT, &HARVESTED_CARBON_LAYOUT, &SUMMARY_LAYOUT] {
                prop_assert!(layout.fields.len() <= seeds.len());
                let line = render_line(layout.fields, &seeds);
                let decoded = decode_line(&line, layout.fields).unwrap();
                prop_assert_eq!(decoded.len(), layout.fields.len());

                for ((name, value), spec) in decoded.iter().zip(layout.fields) {
                    prop_assert_eq!(*name, spec.name);
                    prop_assert_eq!(encode_field(value, spec), spec.slice(&line).unwrap());
                }
            }
        }
    }
}
