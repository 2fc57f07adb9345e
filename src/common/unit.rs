//! Dimension literal parsing.
//!
//! Command-line lengths are PostScript points (1 pt = 1/72 in) with optional
//! unit suffixes; the `w` and `h` suffixes scale by the current output sheet
//! size, so they can only be resolved once that size is known.

use crate::common::error::{Error, Result};

pub const PT_PER_IN: f64 = 72.0;
pub const PT_PER_CM: f64 = 28.346456692913385;
pub const PT_PER_MM: f64 = 2.8346456692913385;

/// Output sheet size visible to the `w`/`h` suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimenContext {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Parse a decimal number prefix; returns the value and the unconsumed rest.
///
/// Unlike C `atof`-style scanning, a sign is accepted only in leading
/// position and an input with no digits is an error.
pub fn parse_double(s: &str) -> Result<(f64, &str)> {
    match fast_float2::parse_partial::<f64, _>(s) {
        Ok((num, n)) if n > 0 => Ok((num, &s[n..])),
        _ => Err(Error::BadDimension(s.to_string())),
    }
}

/// Parse a dimension prefix with an optional unit suffix; returns points and
/// the unconsumed rest.
pub fn parse_dimen<'a>(s: &'a str, ctx: &DimenContext) -> Result<(f64, &'a str)> {
    let (num, rest) = parse_double(s)?;
    if let Some(r) = rest.strip_prefix("pt") {
        Ok((num, r))
    } else if let Some(r) = rest.strip_prefix("in") {
        Ok((num * PT_PER_IN, r))
    } else if let Some(r) = rest.strip_prefix("cm") {
        Ok((num * PT_PER_CM, r))
    } else if let Some(r) = rest.strip_prefix("mm") {
        Ok((num * PT_PER_MM, r))
    } else if let Some(r) = rest.strip_prefix('w') {
        let width = ctx.width.ok_or(Error::WidthNotSet)?;
        Ok((num * width, r))
    } else if let Some(r) = rest.strip_prefix('h') {
        let height = ctx.height.ok_or(Error::HeightNotSet)?;
        Ok((num * height, r))
    } else {
        Ok((num, rest))
    }
}

/// Parse a complete single-dimension argument; trailing garbage is an error.
pub fn single_dimen(s: &str, ctx: &DimenContext) -> Result<f64> {
    let (num, rest) = parse_dimen(s, ctx)?;
    if !rest.is_empty() {
        return Err(Error::BadDimension(s.to_string()));
    }
    Ok(num)
}

/// Parse a complete unitless numeric argument.
pub fn single_double(s: &str) -> Result<f64> {
    let (num, rest) = parse_double(s)?;
    if !rest.is_empty() {
        return Err(Error::BadDimension(s.to_string()));
    }
    Ok(num)
}

/// Parse a nonempty all-digits integer (the n-up count).
pub fn parse_int(s: &str) -> Result<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::BadNumber(s.to_string()));
    }
    s.parse().map_err(|_| Error::BadNumber(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DimenContext {
        DimenContext {
            width: Some(595.0),
            height: Some(842.0),
        }
    }

    #[test]
    fn bare_number_is_points() {
        assert_eq!(single_dimen("10", &ctx()).unwrap(), 10.0);
        assert_eq!(single_dimen("-3.5", &ctx()).unwrap(), -3.5);
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(single_dimen("2pt", &ctx()).unwrap(), 2.0);
        assert_eq!(single_dimen("1in", &ctx()).unwrap(), 72.0);
        assert!((single_dimen("2.54cm", &ctx()).unwrap() - 72.0).abs() < 1e-9);
        assert!((single_dimen("25.4mm", &ctx()).unwrap() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn sheet_relative_suffixes() {
        assert_eq!(single_dimen("0.5w", &ctx()).unwrap(), 297.5);
        assert_eq!(single_dimen("1h", &ctx()).unwrap(), 842.0);
    }

    #[test]
    fn sheet_suffix_needs_dims() {
        let empty = DimenContext::default();
        assert!(matches!(
            single_dimen("1w", &empty),
            Err(Error::WidthNotSet)
        ));
        assert!(matches!(
            single_dimen("1h", &empty),
            Err(Error::HeightNotSet)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(single_dimen("", &ctx()).is_err());
        assert!(single_dimen("cm", &ctx()).is_err());
        assert!(single_dimen("1.2.3", &ctx()).is_err());
        assert!(single_dimen("10ptx", &ctx()).is_err());
        // sign is only accepted in leading position
        assert!(single_dimen("1-2", &ctx()).is_err());
    }

    #[test]
    fn partial_parse_leaves_rest() {
        let (num, rest) = parse_dimen("3cmabc", &ctx()).unwrap();
        assert!((num - 3.0 * PT_PER_CM).abs() < 1e-9);
        assert_eq!(rest, "abc");
    }

    #[test]
    fn integers() {
        assert_eq!(parse_int("4").unwrap(), 4);
        assert_eq!(parse_int("16").unwrap(), 16);
        assert!(parse_int("").is_err());
        assert!(parse_int("4x").is_err());
        assert!(parse_int("-4").is_err());
    }
}
