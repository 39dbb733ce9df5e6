
use std::fmt::Display;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum RemitoError {
    #[error("empty receipt/delivery number")]
    Empty,
    #[error("could not split remito `{token}` (remito1: `{remito1}`, remito2: `{remito2}`)")]
    Incomplete { token: String, remito1: String, remito2: String },
}

/// Delivery note number (remito)
///
/// Taken from the `Remito y Nro. Entrega` column, which holds the remito
/// followed by the inbound delivery number, e.g. `0114R02179687 0082214777`.
/// The remito itself is a point of sale and a sequence number around an `R`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remito {
    pub point_of_sale: String,
    pub number: String,
}

impl Remito {
    pub fn parse(receipt_and_delivery: &str) -> Result<Self, RemitoError> {
        let token = receipt_and_delivery
            .split_whitespace()
            .next()
            .ok_or(RemitoError::Empty)?;

        let (remito1, remito2) = split_token(token);

        if remito1.is_empty() || remito2.is_empty() {
            return Err(RemitoError::Incomplete {
                token: token.into(),
                remito1: remito1.into(),
                remito2: remito2.into(),
            });
        }

        Ok(Self {
            point_of_sale: remito1.into(),
            number: remito2.into(),
        })
    }

    /// Reference used as the print cover title and label file name
    pub fn document_ref(&self) -> String {
        format!("R{}{}", self.point_of_sale, self.number)
    }
}

fn split_token(token: &str) -> (&str, &str) {
    // `R0114...`: four digit point of sale right after the R
    if let Some(rest) = token.strip_prefix('R') {
        return split_at_char(rest, 4);
    }

    // `0114R02179687`
    if let Some((pos, rest)) = token.split_once('R') {
        let number = rest.split('R').next().unwrap_or_default();
        return (pos, number);
    }

    warn!("unexpected remito format: {}", token);
    split_at_char(token, 4)
}

fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((i, _)) => s.split_at(i),
        None => (s, ""),
    }
}

impl Display for Remito {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}R{}", self.point_of_sale, self.number)
    }
}
