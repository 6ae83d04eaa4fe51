use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::{error::ImportError, identifiers::Identifiers, mapping::MemberMapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    In,
    Out,
    ByRef,
}

impl Default for ParameterDirection {
    fn default() -> Self {
        ParameterDirection::In
    }
}

impl fmt::Display for ParameterDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterDirection::In => "in",
            ParameterDirection::Out => "out",
            ParameterDirection::ByRef => "byref",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedParameter {
    pub name: String,
    pub native_type: String,
    pub direction: ParameterDirection,
    /// `None` for a synthetic "specified" companion.
    pub mapping: Option<MemberMapping>,
}

impl PlannedParameter {
    pub fn is_specified_flag(&self) -> bool {
        self.mapping.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPlan {
    pub parameters: Vec<PlannedParameter>,
    pub return_value: Option<MemberMapping>,
}

impl ParameterPlan {
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|parameter| parameter.name.as_str()).collect()
    }

    pub fn types(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .map(|parameter| parameter.native_type.as_str())
            .collect()
    }

    pub fn directions(&self) -> Vec<ParameterDirection> {
        self.parameters.iter().map(|parameter| parameter.direction).collect()
    }

    pub fn base_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| !parameter.is_specified_flag())
            .count()
    }

    pub fn specified_count(&self) -> usize {
        self.parameters.len() - self.base_count()
    }

    /// Directions of the real parameters, companions left out.
    pub fn base_directions(&self) -> Vec<(String, ParameterDirection)> {
        self.parameters
            .iter()
            .filter_map(|parameter| {
                let mapping = parameter.mapping.as_ref()?;
                Some((mapping.name.clone(), parameter.direction))
            })
            .collect()
    }
}

struct Side<'a> {
    mappings: &'a [MemberMapping],
    used: Vec<bool>,
}

impl<'a> Side<'a> {
    fn new(mappings: &'a [MemberMapping]) -> Self {
        Self {
            mappings,
            used: vec![false; mappings.len()],
        }
    }

    fn take(&mut self, predicate: impl Fn(&MemberMapping) -> bool) -> Option<&'a MemberMapping> {
        let mappings = self.mappings;
        let index = mappings
            .iter()
            .enumerate()
            .position(|(index, mapping)| !self.used[index] && predicate(mapping))?;

        self.used[index] = true;
        Some(&mappings[index])
    }

    fn remaining(&self) -> impl Iterator<Item = &'a MemberMapping> + '_ {
        let mappings = self.mappings;
        mappings
            .iter()
            .enumerate()
            .filter(move |(index, _)| !self.used[*index])
            .map(|(_, mapping)| mapping)
    }
}

/// Orders request and response members into a method signature.
///
/// `parameter_order` tokens come first, in declared order. Remaining
/// request members follow; a request member with a structurally identical
/// response member becomes by-ref. The first remaining response member
/// becomes the return value unless it carries a "specified" flag; every
/// other response member is an out parameter.
pub fn plan_parameters(
    operation: &str,
    request: &[MemberMapping],
    response: &[MemberMapping],
    parameter_order: Option<&[String]>,
    scope: &mut Identifiers,
) -> Result<ParameterPlan, ImportError> {
    let mut request_side = Side::new(request);
    let mut response_side = Side::new(response);
    let mut ordered = Vec::new();

    for token in parameter_order.unwrap_or_default() {
        if let Some(mapping) = request_side.take(|mapping| mapping.name == *token) {
            let direction = match response_side.take(|other| other.is_same_as(mapping)) {
                Some(_) => ParameterDirection::ByRef,
                None => ParameterDirection::In,
            };
            ordered.push((mapping, direction));
        } else if let Some(mapping) = response_side.take(|mapping| mapping.name == *token) {
            ordered.push((mapping, ParameterDirection::Out));
        } else {
            return Err(ImportError::UnresolvedParameterOrder {
                operation: operation.to_owned(),
                token: token.clone(),
            });
        }
    }

    let leftover_requests = request_side.remaining().collect::<Vec<_>>();
    for mapping in leftover_requests {
        let direction = match response_side.take(|other| other.is_same_as(mapping)) {
            Some(_) => ParameterDirection::ByRef,
            None => ParameterDirection::In,
        };
        ordered.push((mapping, direction));
    }

    let mut leftover_responses = response_side.remaining().collect::<Vec<_>>().into_iter();
    let mut return_value = None;

    if let Some(first) = leftover_responses.next() {
        if first.check_specified {
            ordered.push((first, ParameterDirection::Out));
        } else {
            return_value = Some(first.clone());
        }
    }

    for mapping in leftover_responses {
        ordered.push((mapping, ParameterDirection::Out));
    }

    let mut parameters = Vec::new();
    for (mapping, direction) in ordered {
        let name = scope.add_unique(&mapping.member_name, ());

        parameters.push(PlannedParameter {
            name: name.clone(),
            native_type: mapping.native_type.clone(),
            direction,
            mapping: Some(mapping.clone()),
        });

        if mapping.check_specified {
            parameters.push(PlannedParameter {
                name: scope.add_unique(&format!("{}_specified", name), ()),
                native_type: "bool".into(),
                direction,
                mapping: None,
            });
        }
    }

    debug!(
        operation,
        parameters = parameters.len(),
        has_return = return_value.is_some(),
        "planned parameters"
    );

    Ok(ParameterPlan {
        parameters,
        return_value,
    })
}
