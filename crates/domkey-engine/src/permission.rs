use config::{FocusId, OperationControl};

/// Whether `key` may act while `focus` holds focus.
///
/// No focus id, an unknown focus id, a missing `control` and an unrecognised
/// `control` string all deny.
pub fn may_act(control: &OperationControl, focus: Option<&FocusId>, key: &str) -> bool {
    focus
        .and_then(|id| control.get(id))
        .and_then(|entry| entry.control.as_ref())
        .is_some_and(|c| c.allows(key))
}
