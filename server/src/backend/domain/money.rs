//! Money helpers shared by the pricing engine, the record builder and the
//! message templates.
//!
//! Amounts are `f64` reais rounded to cents. Operator input follows the
//! Brazilian convention (`"1.250,50"`) but the plain `"250.00"` form typed
//! on most keyboards is accepted too.

const CURRENCY_SYMBOL: &str = "R$";

/// Round a value to whole cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clean and parse an operator-typed amount
///
/// Accepts `"250"`, `"250,00"`, `"250.00"`, `"1.250,50"` and `"R$ 1.250,50"`.
/// Does not reject zero or negative values; callers decide what is valid.
pub fn parse_amount(input: &str) -> Result<f64, String> {
    let cleaned: String = input
        .trim()
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err("Empty amount".to_string());
    }

    let normalized = if cleaned.contains(',') {
        // comma is the decimal separator, dots group thousands
        if cleaned.matches(',').count() > 1 {
            return Err(format!("Invalid number format: {}", input.trim()));
        }
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    let amount = normalized
        .parse::<f64>()
        .map_err(|e| format!("Invalid number format: {}", e))?;

    if !amount.is_finite() {
        return Err(format!("Invalid number format: {}", input.trim()));
    }

    Ok(round_cents(amount))
}

/// Format an amount as `R$ 1.250,50`
pub fn format_brl(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();

    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}{} {},{:02}", sign, CURRENCY_SYMBOL, grouped, cents % 100)
}
