use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::ClientCallRecord;
use crate::phone::PhoneNumber;

/// Number -> client, restricted to numbers seen under exactly one client.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttributionMap {
    clients: BTreeMap<PhoneNumber, String>,
    /// Numbers seen under two or more clients, with every client they appear under.
    ambiguous: BTreeMap<PhoneNumber, BTreeSet<String>>,
}

impl AttributionMap {
    pub fn client_for(&self, number: Option<&PhoneNumber>) -> Option<&str> {
        number.and_then(|n| self.clients.get(n)).map(String::as_str)
    }

    /// Numbers with a single client.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn ambiguous(&self) -> &BTreeMap<PhoneNumber, BTreeSet<String>> {
        &self.ambiguous
    }
}

/// One-to-one attribution: a number that shows up in more than one client's
/// files is never assigned to any of them.
pub fn resolve(records: &[ClientCallRecord]) -> AttributionMap {
    let mut seen: BTreeMap<&PhoneNumber, BTreeSet<&str>> = BTreeMap::new();
    for record in records {
        if let Some(number) = &record.number {
            seen.entry(number).or_default().insert(record.client_name.as_str());
        }
    }

    let mut map = AttributionMap::default();
    for (number, clients) in seen {
        if clients.len() == 1 {
            if let Some(client) = clients.into_iter().next() {
                map.clients.insert(number.clone(), client.to_string());
            }
        } else {
            map.ambiguous.insert(
                number.clone(),
                clients.into_iter().map(str::to_string).collect(),
            );
        }
    }
    map
}
