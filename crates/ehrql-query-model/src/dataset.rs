//! Dataset definitions
//!
//! A dataset is a population condition plus named patient-level variables.
//! It is the unit of work the engine turns into one output row per patient.

use ehrql_types::Type;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ModelResult, TypeValidationError, ValidationReason};
use crate::graph::QueryGraph;
use crate::model::{NodeId, NodeKind};
use crate::schema::PATIENT_ID;

/// Root name under which the population is serialized
pub const POPULATION: &str = "population";

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));

/// Population plus ordered output variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    population: NodeId,
    variables: IndexMap<String, NodeId>,
}

impl Dataset {
    /// Create a dataset with no variables.
    ///
    /// The population must be a patient-level boolean series.
    pub fn new(graph: &QueryGraph, population: NodeId) -> ModelResult<Self> {
        let meta = graph.require("Dataset", population)?;
        if meta.kind != NodeKind::PatientSeries || meta.ty != Some(Type::Bool) {
            return Err(invalid("population must be a patient-level boolean series"));
        }
        Ok(Self {
            population,
            variables: IndexMap::new(),
        })
    }

    /// Add an output column
    pub fn add_variable(
        &mut self,
        graph: &QueryGraph,
        name: impl Into<String>,
        series: NodeId,
    ) -> ModelResult<()> {
        let name = name.into();
        if !VARIABLE_NAME.is_match(&name) {
            return Err(invalid(format!("invalid variable name {name:?}")));
        }
        if name == PATIENT_ID || name == POPULATION {
            return Err(invalid(format!("{name:?} is reserved")));
        }
        if self.variables.contains_key(&name) {
            return Err(invalid(format!("variable {name:?} defined twice")));
        }
        let meta = graph.require("Dataset", series)?;
        if meta.kind != NodeKind::PatientSeries {
            return Err(invalid(format!(
                "variable {name:?} must be a patient-level series"
            )));
        }
        self.variables.insert(name, series);
        Ok(())
    }

    /// Builder form of [`add_variable`](Self::add_variable)
    pub fn with_variable(
        mut self,
        graph: &QueryGraph,
        name: impl Into<String>,
        series: NodeId,
    ) -> ModelResult<Self> {
        self.add_variable(graph, name, series)?;
        Ok(self)
    }

    pub fn population(&self) -> NodeId {
        self.population
    }

    /// Variables in declaration order
    pub fn variables(&self) -> &IndexMap<String, NodeId> {
        &self.variables
    }

    /// Named roots for serialization, population first
    pub fn to_roots(&self) -> IndexMap<String, NodeId> {
        std::iter::once((POPULATION.to_string(), self.population))
            .chain(self.variables.iter().map(|(name, id)| (name.clone(), *id)))
            .collect()
    }

    /// Rebuild a dataset from named roots
    pub fn from_roots(graph: &QueryGraph, roots: &IndexMap<String, NodeId>) -> ModelResult<Self> {
        let Some(&population) = roots.get(POPULATION) else {
            return Err(invalid("no population"));
        };
        let mut dataset = Self::new(graph, population)?;
        for (name, &id) in roots {
            if name != POPULATION {
                dataset.add_variable(graph, name.clone(), id)?;
            }
        }
        Ok(dataset)
    }
}

fn invalid(message: impl Into<String>) -> TypeValidationError {
    TypeValidationError::new("Dataset", ValidationReason::invalid_dataset(message))
}
