//! Customer update records and the multi-layout line classifier.
//!
//! One physical feed carries three record layouts. The first field is a
//! record-type discriminator; it selects a layout by prefix pattern, then the
//! remaining fields are mapped by position. Blank fields become `None`,
//! which downstream means "leave the stored value unchanged".

use crate::{
    error::{BatchError, BatchResult},
    types::CustomerId,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUpdate {
    pub customer_id: CustomerId,
    pub first_name:  Option<String>,
    pub middle_name: Option<String>,
    pub last_name:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressUpdate {
    pub customer_id: CustomerId,
    pub address1:    Option<String>,
    pub address2:    Option<String>,
    pub city:        Option<String>,
    pub state:       Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
    pub customer_id:             CustomerId,
    pub email_address:           Option<String>,
    pub home_phone:              Option<String>,
    pub cell_phone:              Option<String>,
    pub work_phone:              Option<String>,
    pub notification_preference: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerUpdate {
    Name(NameUpdate),
    Address(AddressUpdate),
    Contact(ContactUpdate),
}

impl CustomerUpdate {
    pub fn customer_id(&self) -> CustomerId {
        match self {
            CustomerUpdate::Name(u)    => u.customer_id,
            CustomerUpdate::Address(u) => u.customer_id,
            CustomerUpdate::Contact(u) => u.customer_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Name,
    Address,
    Contact,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; 3] = [UpdateKind::Name, UpdateKind::Address, UpdateKind::Contact];

    /// Exact discriminator value for this layout.
    pub fn record_type(self) -> &'static str {
        match self {
            UpdateKind::Name    => "1",
            UpdateKind::Address => "2",
            UpdateKind::Contact => "3",
        }
    }

    /// Prefix pattern used to pick this layout.
    pub fn pattern(self) -> &'static str {
        match self {
            UpdateKind::Name    => "1*",
            UpdateKind::Address => "2*",
            UpdateKind::Contact => "3*",
        }
    }

    /// Field names in feed order, discriminator first.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            UpdateKind::Name => &["recordId", "customerId", "firstName", "middleName", "lastName"],
            UpdateKind::Address => &[
                "recordId", "customerId", "address1", "address2", "city", "state", "postalCode",
            ],
            UpdateKind::Contact => &[
                "recordId",
                "customerId",
                "emailAddress",
                "homePhone",
                "cellPhone",
                "workPhone",
                "notificationPreference",
            ],
        }
    }

    /// First layout whose pattern matches `discriminator`.
    pub fn match_pattern(discriminator: &str) -> Option<UpdateKind> {
        Self::ALL
            .into_iter()
            .find(|kind| pattern_matches(kind.pattern(), discriminator))
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateKind::Name    => "name",
            UpdateKind::Address => "address",
            UpdateKind::Contact => "contact",
        };
        f.write_str(s)
    }
}

/// `*` at the end of a pattern matches any suffix; otherwise exact match.
fn pattern_matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value == pattern,
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Classify one delimited record (already split into fields) and map it to a
/// typed update. `record` is the 1-based record position, only used for error reporting.
pub fn classify(fields: &[&str], record: u64) -> BatchResult<CustomerUpdate> {
    let discriminator = fields.first().copied().unwrap_or_default().trim();

    let kind = UpdateKind::match_pattern(discriminator).ok_or_else(|| BatchError::SchemaMismatch {
        record,
        reason: format!("no record layout matches record type '{discriminator}'"),
    })?;

    let names = kind.field_names();
    if fields.len() != names.len() {
        return Err(BatchError::SchemaMismatch {
            record,
            reason: format!(
                "{kind} record expects {} fields, found {}",
                names.len(),
                fields.len()
            ),
        });
    }

    if discriminator != kind.record_type() {
        return Err(BatchError::SchemaMismatch {
            record,
            reason: format!("invalid record type '{discriminator}'"),
        });
    }

    let raw_id = fields[1].trim();
    let customer_id: CustomerId = raw_id.parse().map_err(|_| BatchError::SchemaMismatch {
        record,
        reason: format!("customerId '{raw_id}' is missing or not numeric"),
    })?;

    let update = match kind {
        UpdateKind::Name => CustomerUpdate::Name(NameUpdate {
            customer_id,
            first_name:  non_blank(fields[2]),
            middle_name: non_blank(fields[3]),
            last_name:   non_blank(fields[4]),
        }),
        UpdateKind::Address => CustomerUpdate::Address(AddressUpdate {
            customer_id,
            address1:    non_blank(fields[2]),
            address2:    non_blank(fields[3]),
            city:        non_blank(fields[4]),
            state:       non_blank(fields[5]),
            postal_code: non_blank(fields[6]),
        }),
        UpdateKind::Contact => {
            let raw_pref = fields[6].trim();
            let notification_preference = if raw_pref.is_empty() {
                None
            } else {
                Some(raw_pref.parse::<i64>().map_err(|_| BatchError::FormatError {
                    record,
                    field: "notificationPreference",
                    value: raw_pref.to_string(),
                })?)
            };
            CustomerUpdate::Contact(ContactUpdate {
                customer_id,
                email_address: non_blank(fields[2]),
                home_phone:    non_blank(fields[3]),
                cell_phone:    non_blank(fields[4]),
                work_phone:    non_blank(fields[5]),
                notification_preference,
            })
        }
    };
    Ok(update)
}
