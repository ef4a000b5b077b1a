//! Vocabulary management for the tokenizer

use crate::TokenizerError;
use std::collections::HashMap;

/// Bijective mapping between symbols and dense IDs, in insertion order.
///
/// IDs start at 0 and are never reassigned once handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    /// Token to ID mapping
    token_to_id: HashMap<String, u32>,
    /// ID to token mapping
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vocabulary seeded with the given tokens (IDs 0..n)
    pub fn with_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut vocab = Self::new();
        for token in tokens {
            vocab.add_token(token.as_ref());
        }
        vocab
    }

    /// Rebuild a vocabulary from a symbol -> ID map.
    ///
    /// The IDs must be exactly `0..map.len()` with no repeats.
    pub fn from_map(map: HashMap<String, u32>) -> Result<Self, TokenizerError> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];

        for (token, &id) in &map {
            let slot = slots.get_mut(id as usize).ok_or_else(|| {
                TokenizerError::MalformedRecord(format!(
                    "vocab id {} for {:?} is out of range (vocab has {} entries)",
                    id,
                    token,
                    map.len()
                ))
            })?;
            if let Some(other) = slot {
                return Err(TokenizerError::MalformedRecord(format!(
                    "vocab id {} is assigned to both {:?} and {:?}",
                    id, other, token
                )));
            }
            *slot = Some(token.clone());
        }

        // Every slot is filled: n distinct in-range ids over n slots
        let id_to_token = slots.into_iter().flatten().collect();

        Ok(Self {
            token_to_id: map,
            id_to_token,
        })
    }

    /// Get the vocabulary size
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Add a token to the vocabulary
    /// Returns the token ID (existing or new)
    pub fn add_token(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as u32;
        self.token_to_id.insert(token.to_string(), id);
        self.id_to_token.push(token.to_string());
        id
    }

    /// Get token ID by token string
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Get token string by ID
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(|s| s.as_str())
    }

    /// Check if a token exists in the vocabulary
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// All (id, token) entries in ID order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (id as u32, token.as_str()))
    }
}
