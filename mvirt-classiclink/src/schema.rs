//! Field schema for the ClassicLink resource.

use thiserror::Error;

use crate::state::DesiredState;

/// Field value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    StringSet,
}

/// Declaration of one user-settable field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// A change cannot be applied in place and forces delete + create.
    pub force_new: bool,
}

pub const INSTANCE_ID: &str = "instance_id";
pub const NETWORK_ID: &str = "network_id";
pub const SECURITY_GROUP_IDS: &str = "security_group_ids";

/// Schema of the ClassicLink resource.
pub const CLASSIC_LINK_SCHEMA: &[FieldSchema] = &[
    FieldSchema {
        name: INSTANCE_ID,
        kind: FieldKind::String,
        required: true,
        force_new: false,
    },
    FieldSchema {
        name: NETWORK_ID,
        kind: FieldKind::String,
        required: true,
        force_new: true,
    },
    FieldSchema {
        name: SECURITY_GROUP_IDS,
        kind: FieldKind::StringSet,
        required: true,
        force_new: true,
    },
];

/// Validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must not contain empty values")]
    EmptyValue(&'static str),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Compare one field of two records.
fn field_changed(name: &str, previous: &DesiredState, desired: &DesiredState) -> bool {
    match name {
        INSTANCE_ID => previous.instance_id != desired.instance_id,
        NETWORK_ID => previous.network_id != desired.network_id,
        SECURITY_GROUP_IDS => previous.security_group_ids != desired.security_group_ids,
        _ => false,
    }
}

/// Check that every required field is set.
pub fn validate(state: &DesiredState) -> Result<()> {
    for field in CLASSIC_LINK_SCHEMA.iter().filter(|f| f.required) {
        match field.name {
            INSTANCE_ID if state.instance_id.trim().is_empty() => {
                return Err(ValidationError::Required(field.name));
            }
            NETWORK_ID if state.network_id.trim().is_empty() => {
                return Err(ValidationError::Required(field.name));
            }
            SECURITY_GROUP_IDS => {
                if state.security_group_ids.is_empty() {
                    return Err(ValidationError::Required(field.name));
                }
                if state.security_group_ids.iter().any(|sg| sg.trim().is_empty()) {
                    return Err(ValidationError::EmptyValue(field.name));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Names of the force-new fields that differ between two records.
///
/// A non-empty result means the link has to be recreated.
pub fn replacement_fields(previous: &DesiredState, desired: &DesiredState) -> Vec<&'static str> {
    CLASSIC_LINK_SCHEMA
        .iter()
        .filter(|f| f.force_new && field_changed(f.name, previous, desired))
        .map(|f| f.name)
        .collect()
}
