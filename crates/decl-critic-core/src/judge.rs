//! Export-equals judgement.
//!
//! Given the inferred type of a whole-module export, decides whether a
//! faithful declaration must use the whole-module-export convention. Only
//! indivisible values (functions, classes, primitives, arrays) force a
//! consumer to import the whole value; plain data objects do not.

use serde::{Deserialize, Serialize};

use crate::oracle::{TypeFlag, TypeHandle};
use crate::types::{InferenceFailure, InferenceResult};

/// Whether the whole-module-export convention is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportEqualsJudgement {
    /// The declaration must export the whole value as one assignment.
    Required,
    /// Named exports describe the value faithfully.
    NotRequired,
}

impl std::fmt::Display for ExportEqualsJudgement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::NotRequired => write!(f, "not required"),
        }
    }
}

/// A judgement paired with a human-readable justification.
///
/// Never a bare boolean: the reason is embedded in the finding shown to the
/// user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEqualsVerdict {
    /// The judgement.
    pub judgement: ExportEqualsJudgement,
    /// Why the judgement holds.
    pub reason: String,
}

/// Judges whether a whole-module export type forces the whole-module-export
/// convention on the declaration.
///
/// # Errors
///
/// Fails when the type is too weak to analyze or matches none of the known
/// shapes; the caller suppresses the dependent check rather than reporting.
pub fn needs_whole_module_export(ty: &dyn TypeHandle) -> InferenceResult<ExportEqualsVerdict> {
    if ty.is_bad_type() {
        return Err(InferenceFailure::new(format!(
            "inferred type '{}' is not good enough to be analyzed",
            ty.render()
        )));
    }

    let callable = ty.is_callable_or_constructable();

    if ty.has_flag(TypeFlag::Object) && !callable && !ty.is_array_like() {
        return Ok(ExportEqualsVerdict {
            judgement: ExportEqualsJudgement::NotRequired,
            reason: "the module's export value is an object which is neither a function, \
                     a class, nor an array"
                .to_owned(),
        });
    }

    if callable {
        return Ok(ExportEqualsVerdict {
            judgement: ExportEqualsJudgement::Required,
            reason: callability_reason(ty),
        });
    }

    let primitive = ty.has_flag(TypeFlag::Boolean)
        || ty.has_flag(TypeFlag::String)
        || ty.has_flag(TypeFlag::Number);
    if primitive {
        return Ok(ExportEqualsVerdict {
            judgement: ExportEqualsJudgement::Required,
            reason: format!("the module's export value has primitive type {}", ty.render()),
        });
    }

    if ty.is_array_like() {
        return Ok(ExportEqualsVerdict {
            judgement: ExportEqualsJudgement::Required,
            reason: format!(
                "the module's export value has array-like type {}",
                ty.render()
            ),
        });
    }

    Err(InferenceFailure::new(format!(
        "could not analyze type '{}'",
        ty.render()
    )))
}

/// Names the capability that makes the export indivisible.
fn callability_reason(ty: &dyn TypeHandle) -> String {
    let callable = ty.call_signature_count() > 0;
    let constructable = ty.construct_signature_count() > 0;
    match (callable, constructable) {
        (true, true) => "the module's export value can be called and instantiated".to_owned(),
        (true, false) => "the module's export value can be called as a function".to_owned(),
        _ => "the module's export value can be instantiated".to_owned(),
    }
}
