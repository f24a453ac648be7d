use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PriceError;

/// Literal the source renders instead of a price for giveaways.
pub const FREE_TOKEN: &str = "FREE";

// ASCII digits only: the amount has to survive u64 parsing.
static PRICE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^0-9]+)([0-9,]+)").expect("Invalid price regex")
});

static LEADING_DIGIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[0-9]").expect("Invalid leading digit regex")
});

/// Parse the first currency/amount pair out of a price fragment.
///
/// `"FREE"` yields `("", 0)`. Anything else must start with a non-digit
/// currency marker followed by digits with optional thousands commas, e.g.
/// `"$1,234"` or `"CA$ 99"`. Text after the first number is ignored, so
/// ranges like `"$10 - $20"` give the lower bound.
pub fn parse_price(text: &str) -> Result<(String, u64), PriceError> {
    if text == FREE_TOKEN {
        return Ok((String::new(), 0));
    }

    let Some(captures) = PRICE_REGEX.captures(text) else {
        if LEADING_DIGIT_REGEX.is_match(text) {
            return Err(PriceError::MissingCurrency(text.to_string()));
        }
        return Err(PriceError::UnrecognizedFormat(text.to_string()));
    };

    let currency = captures[1].trim();
    if currency.is_empty() {
        return Err(PriceError::MissingCurrency(text.to_string()));
    }

    let digits = captures[2].replace(',', "");
    let amount = digits
        .parse::<u64>()
        .map_err(|source| PriceError::InvalidAmount {
            text: text.to_string(),
            source,
        })?;

    Ok((currency.to_string(), amount))
}
