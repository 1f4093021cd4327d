//! Clinical coding systems and code values
//!
//! Every code is tagged with the coding system it belongs to. Codes from
//! different systems never compare equal and the query model refuses to build
//! a comparison between them, so a SNOMED CT `"123"` and a CTV3 `"123"` can
//! never be confused.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::Value;

/// Errors raised while constructing codes and codelists
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// Value does not match the coding system's format
    #[error("Invalid {system} code: {value:?}")]
    InvalidFormat { system: CodingSystem, value: String },

    /// Codelist contains codes of more than one system
    #[error("Codelist for {expected} contains a {found} code: {value:?}")]
    MixedSystems {
        expected: CodingSystem,
        found: CodingSystem,
        value: String,
    },

    /// No coding system registered under this name
    #[error("Unknown coding system: {name}")]
    UnknownSystem { name: String },
}

/// A clinical terminology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodingSystem {
    /// SNOMED CT concept identifiers
    SnomedCt,
    /// Clinical Terms Version 3 (Read v3)
    Ctv3,
    /// ICD-10 diagnosis codes
    Icd10,
    /// OPCS-4 procedure codes
    Opcs4,
    /// NHS Dictionary of Medicines and Devices
    Dmd,
    /// Read codes version 2
    ReadV2,
    /// BNF pseudo-codes for prescribing
    Bnf,
}

static SCTID_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"[1-9][0-9]{5,17}"));
static READ_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"[0-9A-Za-z.]{5}"));
static ICD10_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"[A-Z][0-9]{2}[0-9A-Z]?"));
static OPCS4_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"[A-Z][0-9]{2,3}"));
static BNF_FORMAT: Lazy<Regex> = Lazy::new(|| compile(r"[0-9A-Z]{2,15}"));

fn compile(pattern: &str) -> Regex {
    // Anchored so that the whole value has to match
    Regex::new(&format!("^(?:{pattern})$")).expect("built-in code format is a valid regex")
}

impl CodingSystem {
    /// Every supported coding system
    pub const ALL: [CodingSystem; 7] = [
        Self::SnomedCt,
        Self::Ctv3,
        Self::Icd10,
        Self::Opcs4,
        Self::Dmd,
        Self::ReadV2,
        Self::Bnf,
    ];

    /// Stable lowercase name used in serialized queries
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::SnomedCt => "snomedct",
            Self::Ctv3 => "ctv3",
            Self::Icd10 => "icd10",
            Self::Opcs4 => "opcs4",
            Self::Dmd => "dmd",
            Self::ReadV2 => "readv2",
            Self::Bnf => "bnf",
        }
    }

    /// Human-readable name
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::SnomedCt => "SNOMED CT",
            Self::Ctv3 => "CTV3 (Read V3)",
            Self::Icd10 => "ICD-10",
            Self::Opcs4 => "OPCS-4",
            Self::Dmd => "dm+d",
            Self::ReadV2 => "Read V2",
            Self::Bnf => "BNF",
        }
    }

    /// Format every code of this system must match
    pub fn format(&self) -> &'static Regex {
        match self {
            Self::SnomedCt | Self::Dmd => &SCTID_FORMAT,
            Self::Ctv3 | Self::ReadV2 => &READ_FORMAT,
            Self::Icd10 => &ICD10_FORMAT,
            Self::Opcs4 => &OPCS4_FORMAT,
            Self::Bnf => &BNF_FORMAT,
        }
    }

    /// Check whether `value` is well-formed for this system
    pub fn is_valid(&self, value: &str) -> bool {
        self.format().is_match(value)
    }
}

impl fmt::Display for CodingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A code value tagged with its coding system
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Code {
    /// Coding system the value belongs to
    pub system: CodingSystem,
    /// Raw code string
    value: String,
}

impl Code {
    /// Create a code without checking its format
    pub fn new(system: CodingSystem, value: impl Into<String>) -> Self {
        Self {
            system,
            value: value.into(),
        }
    }

    /// Create a code, checking that the value is well-formed for `system`
    pub fn parse(system: CodingSystem, value: impl Into<String>) -> Result<Self, CodeError> {
        let value = value.into();
        if !system.is_valid(&value) {
            return Err(CodeError::InvalidFormat { system, value });
        }
        Ok(Self { system, value })
    }

    /// Raw code string, for operations that work on the underlying text
    /// (substring search). Comparisons must go through the typed value.
    pub fn to_primitive(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.system.short_name(), self.value)
    }
}

/// A set of codes from one coding system, optionally mapped to categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codelist {
    system: CodingSystem,
    codes: BTreeSet<Code>,
    categories: IndexMap<Code, String>,
}

impl Codelist {
    /// Create a codelist, rejecting codes from any other system
    pub fn new(
        system: CodingSystem,
        codes: impl IntoIterator<Item = Code>,
    ) -> Result<Self, CodeError> {
        let mut list = Self {
            system,
            codes: BTreeSet::new(),
            categories: IndexMap::new(),
        };
        for code in codes {
            list.insert(code)?;
        }
        Ok(list)
    }

    /// Create a codelist from `(code, category)` pairs
    pub fn with_categories(
        system: CodingSystem,
        entries: impl IntoIterator<Item = (Code, String)>,
    ) -> Result<Self, CodeError> {
        let mut list = Self::new(system, [])?;
        for (code, category) in entries {
            list.insert(code.clone())?;
            list.categories.insert(code, category);
        }
        Ok(list)
    }

    fn insert(&mut self, code: Code) -> Result<(), CodeError> {
        if code.system != self.system {
            return Err(CodeError::MixedSystems {
                expected: self.system,
                found: code.system,
                value: code.value,
            });
        }
        self.codes.insert(code);
        Ok(())
    }

    /// Coding system of every code in the list
    pub fn system(&self) -> CodingSystem {
        self.system
    }

    /// Check membership
    pub fn contains(&self, code: &Code) -> bool {
        self.codes.contains(code)
    }

    /// Category assigned to a code, if any
    pub fn category(&self, code: &Code) -> Option<&str> {
        self.categories.get(code).map(String::as_str)
    }

    /// Iterate over the codes in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &Code> {
        self.codes.iter()
    }

    /// Number of codes
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the codelist is empty
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Convert into a set value usable as the right-hand side of `is_in`
    pub fn to_value(&self) -> Value {
        Value::Set(self.codes.iter().cloned().map(Value::Code).collect())
    }
}

/// Explicit name → coding system lookup, passed to whatever needs to resolve
/// coding systems from text (deserialization, codelist loaders)
#[derive(Debug, Clone)]
pub struct CodingSystemRegistry {
    systems: IndexMap<String, CodingSystem>,
}

impl Default for CodingSystemRegistry {
    fn default() -> Self {
        Self::with_standard_systems()
    }
}

impl CodingSystemRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            systems: IndexMap::new(),
        }
    }

    /// Create a registry containing every built-in system under its short name
    pub fn with_standard_systems() -> Self {
        let mut registry = Self::empty();
        for system in CodingSystem::ALL {
            registry.register(system.short_name(), system);
        }
        registry
    }

    /// Register a system under an additional name (e.g. `"snomed"`)
    pub fn register(&mut self, name: impl Into<String>, system: CodingSystem) {
        self.systems.insert(name.into(), system);
    }

    /// Look up a system by name
    pub fn get(&self, name: &str) -> Result<CodingSystem, CodeError> {
        self.systems
            .get(name)
            .copied()
            .ok_or_else(|| CodeError::UnknownSystem {
                name: name.to_string(),
            })
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(String::as_str)
    }
}
