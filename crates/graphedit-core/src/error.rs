use crate::ElementId;
use thiserror::Error;

/// Invariant violations raised while formatting or inserting a single element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("element is missing a required id")]
    MissingId,
    #[error("duplicate element id: {0}")]
    DuplicateId(ElementId),
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("element {0} is not a group")]
    NotAGroup(ElementId),
    #[error("edge {edge} references missing endpoint {endpoint}")]
    MissingEndpoint { edge: ElementId, endpoint: ElementId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter operator: {0}")]
    UnknownOperator(String),
    #[error("unknown filter field: {0}")]
    UnknownField(String),
}
