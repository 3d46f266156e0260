//! Known billing clients and the optional per-run client filter.

use std::collections::BTreeSet;

use crate::types::{ClientId, ValidationError};

/// The fixed set of clients events may be attributed to.
///
/// Loaded once from configuration; never modified during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRegistry {
    clients: BTreeSet<ClientId>,
}

impl ClientRegistry {
    /// Builds a registry from client names. Duplicates (in any casing) collapse.
    pub fn from_names<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clients = names
            .into_iter()
            .map(ClientId::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { clients })
    }

    /// Looks up a name, ignoring case only. Surrounding whitespace is not
    /// stripped, so `"acme "` does not match `acme`.
    pub fn lookup(&self, name: &str) -> Option<&ClientId> {
        let name = name.to_lowercase();
        self.clients.iter().find(|client| client.as_str() == name)
    }

    /// Clients in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientId> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Restricts a run to a subset of clients.
///
/// Names that are not in the registry are allowed; they simply never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    clients: BTreeSet<ClientId>,
}

impl ClientFilter {
    pub fn from_names<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clients = names
            .into_iter()
            .map(ClientId::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { clients })
    }

    /// Parses a comma-separated list such as `acme,Mosaik`. Empty entries are skipped.
    pub fn parse_list(list: &str) -> Result<Self, ValidationError> {
        Self::from_names(list.split(',').filter(|name| !name.trim().is_empty()))
    }

    pub fn allows(&self, client: &ClientId) -> bool {
        self.clients.contains(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_ignores_case() {
        let registry = ClientRegistry::from_names(["Acme", "Mosaik"]).unwrap();
        assert!(registry.lookup("acme").is_some());
        assert!(registry.lookup("MOSAIK").is_some());
        assert!(registry.lookup("globex").is_none());
        assert_eq!(registry.lookup("ACME").unwrap().as_str(), "acme");
    }

    #[test]
    fn registry_collapses_duplicates() {
        let registry = ClientRegistry::from_names(["acme", "ACME", "Acme"]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_rejects_blank_names() {
        assert!(ClientRegistry::from_names(["acme", " "]).is_err());
    }

    #[test]
    fn registry_lookup_of_empty_token_misses() {
        let registry = ClientRegistry::from_names(["acme"]).unwrap();
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn registry_lookup_does_not_trim() {
        let registry = ClientRegistry::from_names(["acme"]).unwrap();
        assert!(registry.lookup("acme\u{a0}").is_none());
        assert!(registry.lookup("acme\t").is_none());
        assert!(registry.lookup(" acme").is_none());
    }

    #[test]
    fn registry_iterates_in_name_order() {
        let registry = ClientRegistry::from_names(["zeta", "alpha", "Mid"]).unwrap();
        let names: Vec<_> = registry.iter().map(ClientId::as_str).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn filter_parse_list_lowercases_and_skips_blanks() {
        let filter = ClientFilter::parse_list("Acme,,mosaik, ").unwrap();
        assert!(filter.allows(&ClientId::new("acme").unwrap()));
        assert!(filter.allows(&ClientId::new("Mosaik").unwrap()));
        assert!(!filter.allows(&ClientId::new("globex").unwrap()));
    }
}
