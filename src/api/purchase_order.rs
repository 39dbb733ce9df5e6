
use std::fmt::{Display, Debug};
use regex::Regex;

lazy_static! {
    static ref LEADING_DIGITS: Regex = Regex::new(r"^(\d+)").expect("Failed to build LEADING_DIGITS regex");
    static ref BOUNDED_PO: Regex = Regex::new(r"\b(\d{8,12})\b").expect("Failed to build BOUNDED_PO regex");
}

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 12;

/// Purchase order (OC) number
///
/// Delivery spreadsheets are named `{purchase order} {delivery}`,
/// e.g. `5600025440 0082214777.xlsx`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PurchaseOrder(String);

impl PurchaseOrder {
    /// Extract the purchase order from a file name without extension
    ///
    /// The leading run of digits wins if it is 8 to 12 digits long.
    /// Otherwise the first standalone 8 to 12 digit number is used.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        if let Some(caps) = LEADING_DIGITS.captures(stem) {
            let digits = caps.get(1)?.as_str();
            if (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
                return Some(Self(digits.into()));
            }
        }

        BOUNDED_PO
            .captures(stem)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PurchaseOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PurchaseOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OC<{}>", self.0)
    }
}
