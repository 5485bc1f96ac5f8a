//! Categorical codec
//!
//! Bidirectional encode/decode of categorical columns to integer codes. The
//! mapping table is an explicit value owned by the caller and scoped to one
//! dataset session; the same table must be threaded into both `encode` and
//! `decode` or decoding fails for any column that was never fit.

use magscope_common::errors::{AppError, Result};
use magscope_common::frame::{Frame, Value};
use std::collections::HashMap;
use tracing::debug;

/// A fitted encoder for one column: distinct values in first-seen order
#[derive(Debug, Clone, Default)]
pub struct LabelCodec {
    classes: Vec<Value>,
    index: HashMap<String, i64>,
}

impl LabelCodec {
    /// Fit the codec on a column and return the encoded cells.
    /// Codes are assigned 0..k-1 in first-seen order.
    fn fit_transform(values: &[Value]) -> (Self, Vec<Value>) {
        let mut codec = LabelCodec::default();
        let mut encoded = Vec::with_capacity(values.len());

        for value in values {
            // Nulls were filtered by encode() before fitting
            let key = value.key().unwrap_or_default();
            let code = match codec.index.get(&key) {
                Some(&code) => code,
                None => {
                    let code = codec.classes.len() as i64;
                    codec.classes.push(value.clone());
                    codec.index.insert(key, code);
                    code
                }
            };
            encoded.push(Value::Int(code));
        }

        (codec, encoded)
    }

    /// Distinct values seen at fit time, in code order
    pub fn classes(&self) -> &[Value] {
        &self.classes
    }

    /// Map a code back to its original value
    fn class_of(&self, column: &str, code: i64) -> Result<Value> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .cloned()
            .ok_or_else(|| AppError::UnknownCode {
                column: column.to_string(),
                code,
            })
    }
}

/// Column name -> fitted codec, owned by the caller
pub type CodecTable = HashMap<String, LabelCodec>;

/// Encode the listed categorical columns to integer codes.
///
/// Rows holding a null in any listed column are dropped first. Each listed
/// column is fit fresh, overwriting any previous fit recorded in `table`.
/// Returns a new frame; the input is never mutated.
pub fn encode(frame: &Frame, columns: &[String], table: &mut CodecTable) -> Result<Frame> {
    // Resolve all columns up front so a missing one fails before any work
    for column in columns {
        frame.column(column)?;
    }

    let mut mask = vec![true; frame.len()];
    for column in columns {
        for (row, value) in frame.column(column)?.iter().enumerate() {
            if value.is_null() {
                mask[row] = false;
            }
        }
    }

    let mut out = frame.retain_rows(&mask);
    for column in columns {
        let (codec, encoded) = LabelCodec::fit_transform(out.column(column)?);
        debug!(
            column = %column,
            classes = codec.classes.len(),
            rows = out.len(),
            "Fit categorical codec"
        );
        table.insert(column.clone(), codec);
        out = out.with_column(column, encoded)?;
    }

    Ok(out)
}

/// Decode previously encoded columns back to their original values.
///
/// Columns absent from `table` pass through unchanged. A code that was never
/// fit is a lookup failure, never a silent pass-through.
pub fn decode(frame: &Frame, columns: &[String], table: &CodecTable) -> Result<Frame> {
    let mut out = frame.clone();

    for column in columns {
        let Some(codec) = table.get(column) else {
            continue;
        };

        let decoded = out
            .column(column)?
            .iter()
            .map(|value| {
                let code = value.as_i64().ok_or_else(|| AppError::InvalidFormat {
                    message: format!(
                        "column {} holds non-integer cell {:?} where a fitted code was expected",
                        column, value
                    ),
                })?;
                codec.class_of(column, code)
            })
            .collect::<Result<Vec<_>>>()?;

        out = out.with_column(column, decoded)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from_columns(vec![
            (
                "PaperId".into(),
                vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)],
            ),
            (
                "DocType".into(),
                vec![
                    Value::Str("Journal".into()),
                    Value::Str("Conference".into()),
                    Value::Null,
                    Value::Str("Journal".into()),
                ],
            ),
            (
                "JournalName".into(),
                vec![
                    Value::Str("Nature".into()),
                    Value::Str("Science".into()),
                    Value::Str("Nature".into()),
                    Value::Str("Nature".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_drops_null_rows_and_assigns_first_seen_codes() {
        let mut table = CodecTable::new();
        let cols = vec!["DocType".to_string()];
        let encoded = encode(&frame(), &cols, &mut table).unwrap();

        // Row 3 had a null DocType and is gone
        assert_eq!(encoded.len(), 3);
        assert_eq!(
            encoded.column("DocType").unwrap(),
            &[Value::Int(0), Value::Int(1), Value::Int(0)]
        );
        assert_eq!(table["DocType"].classes().len(), 2);
    }

    #[test]
    fn test_round_trip_restores_surviving_rows() {
        let mut table = CodecTable::new();
        let cols = vec!["DocType".to_string(), "JournalName".to_string()];
        let original = frame();

        let encoded = encode(&original, &cols, &mut table).unwrap();
        let decoded = decode(&encoded, &cols, &table).unwrap();

        // The null DocType row was dropped during encode; compare the rest
        let survivors = original.retain_rows(&[true, true, false, true]);
        assert_eq!(
            decoded.column("DocType").unwrap(),
            survivors.column("DocType").unwrap()
        );
        assert_eq!(
            decoded.column("JournalName").unwrap(),
            survivors.column("JournalName").unwrap()
        );
    }

    #[test]
    fn test_decode_unknown_code_fails() {
        let mut table = CodecTable::new();
        let cols = vec!["DocType".to_string()];
        let encoded = encode(&frame(), &cols, &mut table).unwrap();

        // Inject a code that was never fit
        let poisoned = encoded
            .with_column("DocType", vec![Value::Int(7), Value::Int(0), Value::Int(1)])
            .unwrap();
        let err = decode(&poisoned, &cols, &table).unwrap_err();
        assert!(matches!(err, AppError::UnknownCode { code: 7, .. }));
    }

    #[test]
    fn test_decode_non_integer_cell_is_invalid_format() {
        let mut table = CodecTable::new();
        let cols = vec!["DocType".to_string()];
        let encoded = encode(&frame(), &cols, &mut table).unwrap();

        // A cell that never held a code cannot be reported as a code lookup
        let poisoned = encoded
            .with_column(
                "DocType",
                vec![
                    Value::Str("Journal".into()),
                    Value::Int(0),
                    Value::Int(1),
                ],
            )
            .unwrap();
        let err = decode(&poisoned, &cols, &table).unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
    }

    #[test]
    fn test_decode_unfitted_column_passes_through() {
        let table = CodecTable::new();
        let cols = vec!["JournalName".to_string()];
        let original = frame();

        let decoded = decode(&original, &cols, &table).unwrap();
        assert_eq!(
            decoded.column("JournalName").unwrap(),
            original.column("JournalName").unwrap()
        );
    }

    #[test]
    fn test_encode_missing_column_fails_before_filtering() {
        let mut table = CodecTable::new();
        let cols = vec!["FieldOfStudy_0".to_string()];
        let err = encode(&frame(), &cols, &mut table).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_encode_does_not_mutate_input() {
        let mut table = CodecTable::new();
        let cols = vec!["DocType".to_string()];
        let original = frame();
        let before = original.fingerprint();

        encode(&original, &cols, &mut table).unwrap();
        assert_eq!(original.fingerprint(), before);
    }
}
