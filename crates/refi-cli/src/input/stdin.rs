use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a piped JSON document from stdin, deserialised into the command's
/// typed input. Returns None when stdin is an interactive TTY or nothing
/// was piped, so the caller can fall back to `--input`.
pub fn read_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse(&buffer)
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let doc: T = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse piped input: {e}"))?;
    Ok(Some(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refi_core::loan::LoanParams;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_empty_pipe_falls_back() {
        assert!(parse::<LoanParams>(" \n").unwrap().is_none());
    }

    #[test]
    fn test_parse_typed_document() {
        let doc = r#"{"principal": "250000", "annual_rate": "0.06", "term_months": 360}"#;
        let loan = parse::<LoanParams>(doc).unwrap().unwrap();
        assert_eq!(loan.principal, dec!(250000));
        assert_eq!(loan.term_months, 360);
    }

    #[test]
    fn test_parse_malformed_document_errors() {
        assert!(parse::<LoanParams>("{not json").is_err());
    }
}
