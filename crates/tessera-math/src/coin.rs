//! Coin and Coins types for handling tokens

use crate::int::Int;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("invalid denomination: {0}")]
    InvalidDenom(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("negative amount not allowed")]
    NegativeAmount,

    #[error("duplicate denomination: {0}")]
    DuplicateDenom(String),

    #[error("invalid coin expression: {0}")]
    InvalidCoin(String),
}

/// A single coin with denomination and amount
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Int,
}

impl Coin {
    /// Create a new coin, validating denomination and amount
    pub fn new(denom: impl Into<String>, amount: Int) -> Result<Self, CoinError> {
        let denom = denom.into();
        if !is_valid_denom(&denom) {
            return Err(CoinError::InvalidDenom(denom));
        }

        if amount.is_negative() {
            return Err(CoinError::NegativeAmount);
        }

        Ok(Self { denom, amount })
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_valid(&self) -> bool {
        is_valid_denom(&self.denom) && !self.amount.is_negative()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinError;

    /// Parses `<amount><denom>`, e.g. `600000000000000000stake`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split_pos = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinError::InvalidCoin(s.to_string()))?;
        let (amount_str, denom) = s.split_at(split_pos);
        if amount_str.is_empty() {
            return Err(CoinError::InvalidCoin(s.to_string()));
        }

        let amount = Int::from_str(amount_str)
            .map_err(|_| CoinError::InvalidAmount(amount_str.to_string()))?;
        Coin::new(denom.trim(), amount)
    }
}

/// A collection of coins, always sorted by denomination
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Create a new Coins collection from a vector of coins
    /// Enforces sorting by denomination and no duplicates
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, CoinError> {
        coins.retain(|c| !c.is_zero());
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));

        for window in coins.windows(2) {
            if window[0].denom == window[1].denom {
                return Err(CoinError::DuplicateDenom(window[0].denom.clone()));
            }
        }

        Ok(Self(coins))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Every coin has a valid denom and a strictly positive amount
    pub fn is_all_positive(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|c| c.is_valid() && c.amount.is_positive())
    }

    pub fn is_any_negative(&self) -> bool {
        self.0.iter().any(|c| c.amount.is_negative())
    }

    /// Add a coin to the collection, merging amounts of equal denominations
    pub fn add(&mut self, coin: Coin) {
        if coin.is_zero() {
            return;
        }

        match self.0.iter_mut().find(|c| c.denom == coin.denom) {
            Some(existing) => existing.amount = existing.amount.clone() + coin.amount,
            None => {
                self.0.push(coin);
                self.0.sort_by(|a, b| a.denom.cmp(&b.denom));
            }
        }
    }

    /// Sum of two collections
    pub fn plus(&self, other: &Coins) -> Coins {
        let mut sum = self.clone();
        for coin in other.as_slice() {
            sum.add(coin.clone());
        }
        sum
    }

    /// Find amount of a specific denomination
    pub fn amount_of(&self, denom: &str) -> Int {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount.clone())
            .unwrap_or_else(Int::zero)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", s.join(","))
    }
}

impl FromStr for Coins {
    type Err = CoinError;

    /// Parses a comma separated coin list; the empty string yields no coins
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::empty());
        }
        let coins = s
            .split(',')
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Coins::new(coins)
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        let mut coins = Coins::empty();
        coins.add(coin);
        coins
    }
}

/// Denominations start with a letter, 3 to 64 characters drawn from
/// alphanumerics and `/:._-`
fn is_valid_denom(denom: &str) -> bool {
    if denom.len() < 3 || denom.len() > 64 {
        return false;
    }

    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coin() {
        let coin: Coin = "600000000000000000stake".parse().unwrap();
        assert_eq!(coin.denom, "stake");
        assert_eq!(coin.amount.to_string(), "600000000000000000");

        let coin: Coin = "1iris-atto".parse().unwrap();
        assert_eq!(coin.denom, "iris-atto");

        assert!("stake".parse::<Coin>().is_err());
        assert!("100".parse::<Coin>().is_err());
        assert!("10s".parse::<Coin>().is_err());
    }

    #[test]
    fn test_parse_coins_sorted() {
        let coins: Coins = "5stake,3atom".parse().unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins.as_slice()[0].denom, "atom");
        assert_eq!(coins.to_string(), "3atom,5stake");

        assert!("".parse::<Coins>().unwrap().is_empty());
        assert!(matches!(
            "1stake,2stake".parse::<Coins>(),
            Err(CoinError::DuplicateDenom(_))
        ));
    }

    #[test]
    fn test_add_merges_denoms() {
        let mut coins: Coins = "1stake".parse().unwrap();
        coins.add("2stake".parse().unwrap());
        coins.add("4atom".parse().unwrap());
        assert_eq!(coins.amount_of("stake"), Int::from_u64(3));
        assert_eq!(coins.as_slice()[0].denom, "atom");

        let doubled = coins.plus(&coins);
        assert_eq!(doubled.amount_of("atom"), Int::from_u64(8));
    }

    #[test]
    fn test_positive_checks() {
        let coins: Coins = "1stake".parse().unwrap();
        assert!(coins.is_all_positive());
        assert!(!Coins::empty().is_all_positive());
        assert!(!coins.is_any_negative());
    }

    #[test]
    fn test_serializes_as_array() {
        let coins: Coins = "1stake".parse().unwrap();
        let json = serde_json::to_string(&coins).unwrap();
        assert_eq!(json, r#"[{"denom":"stake","amount":"1"}]"#);
    }
}
