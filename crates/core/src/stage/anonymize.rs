//! Anonymization of payees and accounts.

use std::collections::HashMap;
use std::rc::Rc;

use sha2::{Digest, Sha256};
use tallyline_shared::types::EntryId;

use super::{Next, Stage};
use crate::chain::ChainError;
use crate::journal::{Entry, Transaction};

const TOKEN_LEN: usize = 8;

/// Assigns each distinct source string a stable hex token.
#[derive(Debug, Default)]
struct Tokens {
    by_source: HashMap<String, String>,
    owners: HashMap<String, String>,
}

impl Tokens {
    /// Token for `source`: a prefix of its SHA-256 digest, lengthened
    /// until no other source holds it.
    fn token(&mut self, source: &str) -> String {
        if let Some(token) = self.by_source.get(source) {
            return token.clone();
        }

        let digest = format!("{:x}", Sha256::digest(source.as_bytes()));
        let mut len = TOKEN_LEN;
        let mut suffix = 0;
        let mut token = digest[..len].to_string();
        while self.owners.contains_key(&token) {
            if len < digest.len() {
                len = (len + 4).min(digest.len());
                token = digest[..len].to_string();
            } else {
                suffix += 1;
                token = format!("{digest}-{suffix}");
            }
        }

        self.owners.insert(token.clone(), source.to_string());
        self.by_source.insert(source.to_string(), token.clone());
        token
    }

    /// Tokenizes each `:`-separated segment. Synthesized account names
    /// such as `<Total>` are kept.
    fn account(&mut self, account: &str) -> String {
        if account.starts_with('<') {
            return account.to_string();
        }
        account
            .split(':')
            .map(|segment| self.token(segment))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Replaces payees and account names with stable tokens and drops notes.
///
/// The same input always maps to the same token within one run, and
/// distinct inputs never share a token. Anonymized entries keep their
/// identity.
pub struct Anonymize<'a> {
    tokens: Tokens,
    entries: HashMap<EntryId, Rc<Entry>>,
    next: Next<'a>,
}

impl<'a> Anonymize<'a> {
    /// Creates an anonymizing stage.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            tokens: Tokens::default(),
            entries: HashMap::new(),
            next,
        }
    }

    fn anonymized_entry(&mut self, entry: &Rc<Entry>) -> Rc<Entry> {
        if let Some(cached) = self.entries.get(&entry.id) {
            return Rc::clone(cached);
        }

        let mut anonymized = Entry::clone(entry);
        // Entries without postings were synthesized and name no one.
        if !entry.postings.is_empty() {
            anonymized.payee = self.tokens.token(&entry.payee);
        }
        for posting in &mut anonymized.postings {
            posting.account = self.tokens.account(&posting.account);
            posting.note = None;
        }

        let anonymized = Rc::new(anonymized);
        self.entries.insert(entry.id, Rc::clone(&anonymized));
        anonymized
    }
}

impl Stage for Anonymize<'_> {
    fn accept(&mut self, mut xact: Transaction) -> Result<(), ChainError> {
        let entry = self.anonymized_entry(&xact.entry);
        xact.account = self.tokens.account(&xact.account);
        xact.note = None;
        self.next.accept(xact.with_entry(entry))
    }

    fn finish(&mut self) -> Result<(), ChainError> {
        self.next.finish()
    }

    fn name(&self) -> &'static str {
        "anonymize"
    }

    fn downstream(&self) -> Option<&dyn Stage> {
        Some(self.next.as_ref())
    }
}
