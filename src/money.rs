//! Invoice arithmetic and display formatting.
//!
//! All math stays in unrounded `f64`; rounding to cents happens only in
//! [`format_currency`]. Missing or non-finite inputs count as zero so neither
//! the terminal output nor the PDF can ever show `NaN`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{InvoiceData, LineItem};

/// Derived totals for one invoice snapshot. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Amount of a single line: `quantity * rate`, unset values count as 0.
pub fn item_amount(quantity: Option<f64>, rate: Option<f64>) -> f64 {
    finite_or_zero(quantity) * finite_or_zero(rate)
}

/// Sum of the stored `amount` of each item.
pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(|item| finite_or_zero(Some(item.amount()))).sum()
}

/// `subtotal * rate / 100`; an unset rate means no tax.
pub fn tax_amount(subtotal: f64, tax_rate_percent: Option<f64>) -> f64 {
    finite_or_zero(Some(subtotal)) * finite_or_zero(tax_rate_percent) / 100.0
}

pub fn total(subtotal: f64, tax_amount: f64) -> f64 {
    subtotal + tax_amount
}

pub fn compute_totals(data: &InvoiceData) -> Totals {
    let subtotal = subtotal(&data.items);
    let tax_amount = tax_amount(subtotal, data.tax);
    Totals {
        subtotal,
        tax_amount,
        total: total(subtotal, tax_amount),
    }
}

/// Format an amount as US dollars: `$1,234.50`, `-$5.00`.
pub fn format_currency(amount: f64) -> String {
    let amount = finite_or_zero(Some(amount));
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_digits(whole), frac)
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

/// `March 5, 2026`, or `-` when the date is unset.
pub fn format_long_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => "-".to_string(),
    }
}

/// Shortest decimal form of a quantity (`5`, `1.5`); unset shows `0`.
pub fn format_quantity(quantity: Option<f64>) -> String {
    format!("{}", finite_or_zero(quantity))
}

pub fn format_percent(rate: f64) -> String {
    format!("{}", finite_or_zero(Some(rate)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_digits("1"), "1");
        assert_eq!(group_digits("1234"), "1,234");
        assert_eq!(group_digits("1234567"), "1,234,567");
    }

    #[test]
    fn negative_zero_has_no_sign() {
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency(-5.0), "-$5.00");
    }

    #[test]
    fn non_finite_values_format_as_zero() {
        assert_eq!(format_currency(f64::NAN), "$0.00");
        assert_eq!(item_amount(Some(f64::NAN), Some(3.0)), 0.0);
        assert_eq!(format_quantity(None), "0");
    }
}
