//! Merge Policy: does a request add anything the matched group does not already know?

use crate::contact::Contact;
use std::fmt;

/// Why a write is (or is not) required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeReason {
    /// More than one primary matched; the chains must unify.
    MultiplePrimaries,
    NewEmail,
    NewPhone,
    /// The group already represents the request.
    AlreadyKnown,
}

impl fmt::Display for MergeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeReason::MultiplePrimaries => "multiple_primaries",
            MergeReason::NewEmail => "new_email",
            MergeReason::NewPhone => "new_phone",
            MergeReason::AlreadyKnown => "already_known",
        };
        f.write_str(s)
    }
}

/// Outcome of the merge policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDecision {
    pub needs_write: bool,
    /// First applicable reason, in the order primaries, email, phone.
    pub reason: MergeReason,
    pub has_new_email: bool,
    pub has_new_phone: bool,
}

/// Decide whether `group` must be rewritten to absorb the request.
pub fn decide(group: &[Contact], email: Option<&str>, phone_number: Option<&str>) -> MergeDecision {
    let primaries = group.iter().filter(|c| c.is_primary()).count();
    let has_new_email = is_new(group, email, |c| c.email.as_deref());
    let has_new_phone = is_new(group, phone_number, |c| c.phone_number.as_deref());

    let reason = if primaries > 1 {
        MergeReason::MultiplePrimaries
    } else if has_new_email {
        MergeReason::NewEmail
    } else if has_new_phone {
        MergeReason::NewPhone
    } else {
        MergeReason::AlreadyKnown
    };

    MergeDecision {
        needs_write: reason != MergeReason::AlreadyKnown,
        reason,
        has_new_email,
        has_new_phone,
    }
}

/// True if `value` is present and no contact in `group` carries it.
pub(crate) fn is_new<F>(group: &[Contact], value: Option<&str>, field: F) -> bool
where
    F: Fn(&Contact) -> Option<&str>,
{
    match value {
        Some(value) => !group.iter().any(|c| field(c) == Some(value)),
        None => false,
    }
}
