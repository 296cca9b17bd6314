//! Utility functions for amount normalization and display
//!
//! Amounts travel through the importer as `Decimal`; this module owns the
//! canonical form used for storage and equality, and the display format
//! used by the CLI.

use rust_decimal::Decimal;

/// Canonical form of an amount: trailing zeros dropped, then padded back to at
/// least two fractional digits.
///
/// `12.5`, `12.50` and `12.500` all become `12.50`; `0.125` stays `0.125`.
///
/// # Examples
/// ```
/// use bankfeed::utils::canonical_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(canonical_amount(dec!(12.5)).to_string(), "12.50");
/// assert_eq!(canonical_amount(dec!(7)).to_string(), "7.00");
/// ```
pub fn canonical_amount(amount: Decimal) -> Decimal {
    let mut value = amount.normalize();
    if value.scale() < 2 {
        value.rescale(2);
    }
    value
}

/// Format an amount using statement conventions: `.` groups thousands and
/// `,` separates decimals.
///
/// # Examples
/// ```
/// use bankfeed::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234.56)), "1.234,56");
/// assert_eq!(format_amount(dec!(-500)), "-500,00");
/// ```
pub fn format_amount(value: Decimal) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    format!("{}{},{}", sign, with_separators, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_canonical_amount_equal_values_share_text() {
        assert_eq!(canonical_amount(dec!(12.5)).to_string(), "12.50");
        assert_eq!(canonical_amount(dec!(12.50)).to_string(), "12.50");
        assert_eq!(canonical_amount(dec!(12.500)).to_string(), "12.50");
        assert_eq!(canonical_amount(dec!(0)).to_string(), "0.00");
    }

    #[test]
    fn test_canonical_amount_keeps_extra_precision() {
        assert_eq!(canonical_amount(dec!(0.125)).to_string(), "0.125");
        assert_eq!(canonical_amount(dec!(-3.1)).to_string(), "-3.10");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "0,00");
        assert_eq!(format_amount(dec!(12.5)), "12,50");
        assert_eq!(format_amount(dec!(1234567.891)), "1.234.567,89");
        assert_eq!(format_amount(dec!(-98.10)), "-98,10");
    }
}
