//! Abstract language detection
//!
//! Derives the `Language` column from each paper's abstract.

use magscope_common::errors::Result;
use magscope_common::frame::{Frame, Value};
use whatlang::detect;

/// Label for rows whose abstract is missing or undetectable
pub const UNKNOWN_LANGUAGE: &str = "UNKNOWN";

/// Uppercase English name of the detected language, e.g. `ENGLISH`
pub fn detect_language(text: &str) -> Option<String> {
    detect(text).map(|info| info.lang().eng_name().to_uppercase())
}

/// Derive the `Language` column from the `Abstract` column
pub fn add_language(frame: &Frame) -> Result<Frame> {
    let column = frame
        .column("Abstract")?
        .iter()
        .map(|cell| {
            let language = cell
                .as_str()
                .filter(|text| !text.trim().is_empty())
                .and_then(detect_language)
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
            Value::Str(language)
        })
        .collect();

    frame.with_column("Language", column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use magscope_common::errors::AppError;

    #[test]
    fn test_detects_english_and_german() {
        let frame = Frame::from_columns(vec![(
            "Abstract".into(),
            vec![
                Value::Str(
                    "We study the distribution of citation counts across \
                     academic papers and present a simple ranking model."
                        .into(),
                ),
                Value::Str(
                    "Wir untersuchen die Verteilung der Zitationszahlen \
                     wissenschaftlicher Arbeiten und stellen ein einfaches \
                     Modell vor."
                        .into(),
                ),
            ],
        )])
        .unwrap();

        let derived = add_language(&frame).unwrap();
        assert_eq!(
            derived.column("Language").unwrap(),
            &[
                Value::Str("ENGLISH".into()),
                Value::Str("GERMAN".into()),
            ]
        );
    }

    #[test]
    fn test_null_or_empty_abstract_is_unknown() {
        let frame = Frame::from_columns(vec![(
            "Abstract".into(),
            vec![Value::Null, Value::Str("   ".into())],
        )])
        .unwrap();

        let derived = add_language(&frame).unwrap();
        assert_eq!(
            derived.column("Language").unwrap(),
            &[
                Value::Str(UNKNOWN_LANGUAGE.into()),
                Value::Str(UNKNOWN_LANGUAGE.into()),
            ]
        );
    }

    #[test]
    fn test_missing_abstract_column_fails() {
        let frame = Frame::from_columns(vec![("PaperId".into(), vec![Value::Int(1)])]).unwrap();
        let err = add_language(&frame).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { .. }));
    }
}
