//! Fixed entity-type and relationship classifications

/// Interaction/communication entity types, never discovered as child
/// relationships
const ACTIVITY_ENTITIES: &[&str] = &[
    "activitypointer",
    "activityparty",
    "appointment",
    "email",
    "fax",
    "letter",
    "phonecall",
    "recurringappointmentmaster",
    "serviceappointment",
    "task",
];

/// Address sub-record relationships; the generic clone path skips them.
const ADDRESS_RELATIONSHIPS: &[&str] = &[
    "Account_CustomerAddress",
    "Contact_CustomerAddress",
    "Lead_addresses",
];

/// Suffix of address-subrecord identity attributes, never copied
pub const ADDRESS_ID_SUFFIX: &str = "addressid";

pub fn is_activity(entity_name: &str) -> bool {
    ACTIVITY_ENTITIES.contains(&entity_name)
}

pub fn is_address_relationship(relationship_name: &str) -> bool {
    ADDRESS_RELATIONSHIPS.contains(&relationship_name)
}

pub fn is_address_id(attribute_name: &str) -> bool {
    attribute_name.ends_with(ADDRESS_ID_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_types() {
        for name in ACTIVITY_ENTITIES {
            assert!(is_activity(name), "{} should be an activity", name);
        }
        assert!(!is_activity("order"));
        assert!(!is_activity("contact"));
        assert!(!is_activity("Task"));
    }

    #[test]
    fn test_address_relationships() {
        assert!(is_address_relationship("Account_CustomerAddress"));
        assert!(is_address_relationship("Lead_addresses"));
        assert!(!is_address_relationship("account_orders"));
    }

    #[test]
    fn test_address_id_suffix() {
        assert!(is_address_id("address1_addressid"));
        assert!(!is_address_id("address1_city"));
    }
}
