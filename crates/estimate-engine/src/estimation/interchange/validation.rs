use std::collections::BTreeSet;

use super::{InterchangeDocument, InterchangeError};
use crate::estimation::diagnostics::FieldViolation;

fn require(violations: &mut Vec<FieldViolation>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(FieldViolation::new(field, "is required"));
    }
}

/// Gate run before serialization. Collects every offending field.
pub fn validate_document(document: &InterchangeDocument<'_>) -> Result<(), InterchangeError> {
    let mut violations = Vec::new();
    let claim = document.claim;

    require(&mut violations, "claim_number", &claim.claim_number);
    require(&mut violations, "policy_number", &claim.policy_number);
    require(&mut violations, "insured_name", &claim.insured_name);
    if claim.date_of_loss.is_none() {
        violations.push(FieldViolation::new("date_of_loss", "is required"));
    }
    require(&mut violations, "peril.peril_type", &claim.peril.peril_type);
    if let Some(category) = claim.peril.water_category {
        if !(1..=3).contains(&category) {
            violations.push(FieldViolation::new(
                "peril.water_category",
                format!("must be 1, 2 or 3, got {}", category),
            ));
        }
    }
    if let Some(class) = claim.peril.water_class {
        if !(1..=4).contains(&class) {
            violations.push(FieldViolation::new(
                "peril.water_class",
                format!("must be between 1 and 4, got {}", class),
            ));
        }
    }

    let mut room_ids = BTreeSet::new();
    for (index, room) in document.rooms.iter().enumerate() {
        if room.room_id.trim().is_empty() {
            violations.push(FieldViolation::new(format!("rooms[{index}].room_id"), "is required"));
        } else if !room_ids.insert(room.room_id.as_str()) {
            violations.push(FieldViolation::new(
                format!("rooms[{index}].room_id"),
                format!("duplicate room id '{}'", room.room_id),
            ));
        }
        require(&mut violations, &format!("rooms[{index}].name"), &room.name);
        if room.dimensions.is_none() {
            violations.push(FieldViolation::new(
                format!("rooms[{index}].dimensions"),
                "dimensions are required to report dimension variables",
            ));
        }
    }

    if document.summary.items.is_empty() {
        violations.push(FieldViolation::new("line_items", "at least one line item is required"));
    }
    for (index, item) in document.summary.items.iter().enumerate() {
        require(&mut violations, &format!("line_items[{index}].description"), &item.description);
        if let Some(room_id) = &item.room_id {
            if !room_ids.contains(room_id.as_str()) {
                violations.push(FieldViolation::new(
                    format!("line_items[{index}].room_id"),
                    format!("unknown room '{}'", room_id),
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(InterchangeError::Validation { violations })
    }
}
