use std::sync::LazyLock;

use regex::Regex;

use crate::wire::{RepairRequest, ServiceType, Step};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x{0600}-\x{06FF}a-zA-Z\s]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^05[0-9]{8}$").unwrap());

/// Issue labels that switch on conditional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    /// Main issue that requires a software sub-issue.
    pub software: String,
    /// Main issue that requires a free-text description.
    pub other: String,
    /// Software sub-issue that requires a free-text description.
    pub software_other: String,
}

/// Why a single field fails its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    Invalid,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn opt_is_blank(s: Option<&str>) -> bool {
    s.map_or(true, is_blank)
}

/// Letters (Latin or Arabic) and whitespace only.
pub fn is_name_valid(name: &str) -> bool {
    !name.is_empty() && NAME_PATTERN.is_match(name)
}

/// Local mobile number: `05` followed by eight digits.
pub fn is_phone_valid(phone: &str) -> bool {
    !phone.is_empty() && PHONE_PATTERN.is_match(phone)
}

pub fn is_device_step_complete(req: &RepairRequest) -> bool {
    !is_blank(&req.manufacturer) && !is_blank(&req.model)
}

pub fn is_issue_step_complete(req: &RepairRequest, sentinels: &Sentinels) -> bool {
    if req.issue.is_empty() {
        return false;
    }
    if req.issue == sentinels.other {
        return !is_blank(&req.issue_description);
    }
    if req.issue == sentinels.software {
        return match req.software_issue.as_deref() {
            None | Some("") => false,
            Some(sub) if sub == sentinels.software_other => !is_blank(&req.issue_description),
            Some(_) => true,
        };
    }
    true
}

pub fn is_contact_step_complete(req: &RepairRequest) -> bool {
    is_name_valid(&req.name)
        && is_phone_valid(&req.phone)
        && (req.service_type != ServiceType::Pickup
            || !opt_is_blank(req.street_address.as_deref()))
}

/// Completeness predicate guarding the transition out of `step`.
pub fn is_step_complete(step: Step, req: &RepairRequest, sentinels: &Sentinels) -> bool {
    match step {
        Step::DeviceInfo => is_device_step_complete(req),
        Step::IssueDescription => is_issue_step_complete(req, sentinels),
        Step::ContactInfo => is_contact_step_complete(req),
        Step::Result => false,
    }
}

/// Whether the description must be filled for the current issue selection.
pub fn description_required(req: &RepairRequest, sentinels: &Sentinels) -> bool {
    req.issue == sentinels.other
        || (req.issue == sentinels.software
            && req.software_issue.as_deref() == Some(sentinels.software_other.as_str()))
}

pub fn name_error(name: &str) -> Option<FieldError> {
    if name.is_empty() {
        Some(FieldError::Required)
    } else if !is_name_valid(name) {
        Some(FieldError::Invalid)
    } else {
        None
    }
}

pub fn phone_error(phone: &str) -> Option<FieldError> {
    if phone.is_empty() {
        Some(FieldError::Required)
    } else if !is_phone_valid(phone) {
        Some(FieldError::Invalid)
    } else {
        None
    }
}

pub fn street_address_error(req: &RepairRequest) -> Option<FieldError> {
    if req.service_type == ServiceType::Pickup && opt_is_blank(req.street_address.as_deref()) {
        Some(FieldError::Required)
    } else {
        None
    }
}

pub fn description_error(req: &RepairRequest, sentinels: &Sentinels) -> Option<FieldError> {
    if description_required(req, sentinels) && is_blank(&req.issue_description) {
        Some(FieldError::Required)
    } else {
        None
    }
}
