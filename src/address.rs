//! Address lookup and the street → house number selection flow.

use std::cmp::Ordering;
use std::io::Read;
use std::mem;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::Address;
use crate::traits::AddressStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Street {
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
}

/// Address database held in memory.
///
/// Matching follows full-text prefix semantics: a street matches when any
/// word of its name starts with the query, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressStore {
    addresses: Vec<Address>,
    streets: Vec<Street>,
}

impl InMemoryAddressStore {
    pub fn new(addresses: Vec<Address>) -> Self {
        let mut streets = addresses
            .iter()
            .map(|address| Street {
                name: address.street.clone(),
                city: address.city.clone(),
                postcode: address.postcode.clone(),
            })
            .collect::<Vec<_>>();
        streets.sort_by(|a, b| {
            (&a.name, &a.city, &a.postcode).cmp(&(&b.name, &b.city, &b.postcode))
        });
        streets.dedup();

        Self { addresses, streets }
    }

    /// Loads a JSON array of addresses.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let addresses: Vec<Address> = serde_json::from_reader(reader)?;
        Ok(Self::new(addresses))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl AddressStore for InMemoryAddressStore {
    fn streets_matching(&self, prefix: &str) -> Vec<Street> {
        let query = prefix.to_lowercase();
        let terms = words(&query);
        self.streets
            .par_iter()
            .filter(|street| matches_all_terms(&street.name, &terms))
            .cloned()
            .collect()
    }

    fn addresses_on(&self, street: &str, housenumber_prefix: &str) -> Vec<Address> {
        let needle = housenumber_prefix.trim().to_lowercase();
        let mut matches = self
            .addresses
            .par_iter()
            .filter(|address| address.street == street)
            .filter(|address| address.housenumber.to_lowercase().starts_with(&needle))
            .cloned()
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| compare_housenumbers(&a.housenumber, &b.housenumber));
        matches
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Every query term must start some word of `name`, in any order.
fn matches_all_terms(name: &str, terms: &[&str]) -> bool {
    let name = name.to_lowercase();
    let name_words = words(&name);
    terms
        .iter()
        .all(|term| name_words.iter().any(|word| word.starts_with(*term)))
}

/// Orders "2" < "10" < "10a" < "11".
fn compare_housenumbers(a: &str, b: &str) -> Ordering {
    let (a_num, a_rest) = split_number(a);
    let (b_num, b_rest) = split_number(b);
    match (a_num, b_num) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a_rest.cmp(b_rest)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn split_number(housenumber: &str) -> (Option<u64>, &str) {
    let digits = housenumber
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(housenumber.len());
    let (number, rest) = housenumber.split_at(digits);
    (number.parse().ok(), rest)
}

/// Two-step address picker: search a street, pick it, search its house
/// numbers, pick an address. Picking an address goes back to street search
/// so several addresses can be collected in order.
#[derive(Debug)]
pub struct AddressSelection<S> {
    store: S,
    query: String,
    street: Option<Street>,
    streets: Vec<Street>,
    candidates: Vec<Address>,
    selected: Vec<Address>,
}

impl<S: AddressStore> AddressSelection<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            query: String::new(),
            street: None,
            streets: Vec::new(),
            candidates: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// Runs the query against streets, or against house numbers once a
    /// street is picked. An empty query clears the results.
    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
        self.streets.clear();
        self.candidates.clear();

        if query.trim().is_empty() {
            return;
        }

        match &self.street {
            Some(street) => self.candidates = self.store.addresses_on(&street.name, query),
            None => self.streets = self.store.streets_matching(query),
        }
        tracing::debug!(
            query,
            streets = self.streets.len(),
            addresses = self.candidates.len(),
            "address search"
        );
    }

    pub fn select_street(&mut self, street: Street) {
        self.street = Some(street);
        self.reset_query();
    }

    pub fn select_address(&mut self, address: Address) {
        self.selected.push(address);
        self.street = None;
        self.reset_query();
    }

    /// Drops the picked street and every selected address.
    pub fn clear(&mut self) {
        self.street = None;
        self.selected.clear();
        self.reset_query();
    }

    /// Hands over the selected addresses in selection order and starts over.
    pub fn finish(&mut self) -> Vec<Address> {
        let selected = mem::take(&mut self.selected);
        self.clear();
        selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn street(&self) -> Option<&Street> {
        self.street.as_ref()
    }

    pub fn streets(&self) -> &[Street] {
        &self.streets
    }

    pub fn candidates(&self) -> &[Address] {
        &self.candidates
    }

    pub fn selected(&self) -> &[Address] {
        &self.selected
    }

    fn reset_query(&mut self) {
        self.query.clear();
        self.streets.clear();
        self.candidates.clear();
    }
}
