use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use log::debug;
use serde::Serialize;

use crate::parser::{remove_token, strip_annotations, FunctionRecord};

/// Prefix tokens only a declaration can spell; they are regeneration hints, not identity
const DECLARATION_ONLY_PREFIXES: &[&str] = &["static", "explicit"];

/// Suffix tokens only a declaration can spell
const DECLARATION_ONLY_SUFFIXES: &[&str] = &["override", "final"];

/// How a function name occurs within one full function list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSlot {
    /// Exactly one function carries the name
    Unique(usize),

    /// Overloaded: two or more functions carry the name
    Ambiguous,
}

/// Correspondence between header declarations and source definitions, by index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairingResult {
    /// `(header, cc)` pairs with identical identity keys
    pub unchanged: Vec<(usize, usize)>,

    /// Header declarations to rewrite, mapped to the definition they now match
    pub changed: BTreeMap<usize, usize>,

    /// Header declarations with no definition left
    pub deleted: BTreeSet<usize>,

    /// Definitions with no declaration, in source order
    pub added: Vec<usize>,
}

impl PairingResult {
    /// Whether the header already matches the definitions
    pub fn is_in_sync(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty() && self.added.is_empty()
    }

    /// Record `change_to` and `marked_deleted` on the header records
    pub fn annotate(&self, header: &mut [FunctionRecord]) {
        for (index, function) in header.iter_mut().enumerate() {
            function.change_to = self.changed.get(&index).copied();
            function.marked_deleted = self.deleted.contains(&index);
        }
    }
}

/// Normalized fingerprint: prefix, return type, name, parameter types and suffix.
/// Attributes and annotation macros are not part of it.
pub fn identity_key(function: &FunctionRecord) -> String {
    let prefix = DECLARATION_ONLY_PREFIXES
        .iter()
        .fold(strip_annotations(&function.prefix), |prefix, token| remove_token(&prefix, token));
    let suffix = DECLARATION_ONLY_SUFFIXES
        .iter()
        .fold(strip_annotations(&function.suffix), |suffix, token| remove_token(&suffix, token));

    let mut parts = vec![prefix, function.return_type.clone(), function.name.clone()];
    parts.extend(function.parameters.iter().map(|p| p.type_and_name.clone()));
    parts.push(suffix);
    parts.join(" ")
}

/// Fill in `identity_key` for every record
pub fn assign_identity_keys(functions: &mut [FunctionRecord]) {
    for function in functions {
        function.identity_key = Some(identity_key(function));
    }
}

/// Classify every name in `functions` as unique or overloaded
pub fn name_slots(functions: &[FunctionRecord]) -> HashMap<&str, NameSlot> {
    let mut slots = HashMap::new();
    for (index, function) in functions.iter().enumerate() {
        slots
            .entry(function.name.as_str())
            .and_modify(|slot| *slot = NameSlot::Ambiguous)
            .or_insert(NameSlot::Unique(index));
    }
    slots
}

fn is_overloaded(slots: &HashMap<&str, NameSlot>, name: &str) -> bool {
    matches!(slots.get(name), Some(NameSlot::Ambiguous))
}

fn key_of(function: &FunctionRecord) -> String {
    function.identity_key.clone().unwrap_or_else(|| identity_key(function))
}

/// Pair header declarations with source definitions.
///
/// Identical keys are unchanged. A single leftover on each side is one edited signature, unless
/// either name is overloaded. Otherwise leftovers pair up by a name that is unique in both full
/// lists; everything else is a deletion or an addition.
pub fn pair(header: &[FunctionRecord], cc: &[FunctionRecord]) -> PairingResult {
    let mut cc_keys: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (index, function) in cc.iter().enumerate() {
        cc_keys.entry(key_of(function)).or_default().push_back(index);
    }

    let mut result = PairingResult::default();
    let mut candidates = Vec::new();
    for (index, function) in header.iter().enumerate() {
        match cc_keys.get_mut(&key_of(function)).and_then(VecDeque::pop_front) {
            Some(cc_index) => result.unchanged.push((index, cc_index)),
            None => candidates.push(index),
        }
    }

    let mut remaining: Vec<usize> = cc_keys.into_values().flatten().collect();
    remaining.sort_unstable();

    if remaining.is_empty() {
        debug!("Only deletions: {}", candidates.len());
        result.deleted = candidates.into_iter().collect();
        return result;
    }

    let header_names = name_slots(header);
    let cc_names = name_slots(cc);

    if let ([deleted], [added]) = (candidates.as_slice(), remaining.as_slice()) {
        if !is_overloaded(&header_names, &header[*deleted].name) && !is_overloaded(&cc_names, &cc[*added].name) {
            debug!("One function changed: {} -> {}", header[*deleted].name, cc[*added].name);
            result.changed.insert(*deleted, *added);
            return result;
        }
    }

    let mut unmatched: BTreeSet<usize> = candidates.into_iter().collect();
    for cc_index in remaining {
        let name = cc[cc_index].name.as_str();
        let header_index = match (cc_names.get(name), header_names.get(name)) {
            (Some(NameSlot::Unique(_)), Some(NameSlot::Unique(h))) if unmatched.contains(h) => Some(*h),
            _ => None,
        };
        match header_index {
            Some(h) => {
                debug!("Paired {} by name", name);
                unmatched.remove(&h);
                result.changed.insert(h, cc_index);
            }
            None => result.added.push(cc_index),
        }
    }
    result.deleted = unmatched;

    result
}
