//! Raw field names per entity type.
//!
//! Every canonical field lists the raw keys it may arrive under, in priority
//! order. Keys not consumed here are passed through untouched.

use crate::entity::EntityType;

type Keys = &'static [&'static str];

/// Where each canonical field lives in a raw record.
#[derive(Debug)]
pub struct FieldProfile {
    pub id: Keys,
    pub address: Keys,
    pub latitude: Keys,
    pub longitude: Keys,
    pub cancelled: Keys,
    pub cancellation_date: Keys,
    pub suspended: Keys,
    pub transmitted: Keys,
    pub suspension_released: Keys,
    pub completed: Keys,
    /// Type-specific text fields: (canonical name, raw keys).
    pub text: &'static [(&'static str, Keys)],
}

const ID: Keys = &["ID", "id", "Id"];
const LATITUDE: Keys = &["Latitude", "latitude", "Lat", "lat"];
const LONGITUDE: Keys = &["Longitude", "longitude", "Lng", "lng", "Long"];

pub static PROJECT: FieldProfile = FieldProfile {
    id: ID,
    address: &["Project_Address", "Address", "address"],
    latitude: LATITUDE,
    longitude: LONGITUDE,
    cancelled: &["Cancelled", "Is_Cancelled"],
    cancellation_date: &["Cancellation_Date", "Cancelled_Date"],
    suspended: &["Suspended_Date", "Suspension_Date", "Suspended"],
    transmitted: &["Transmitted_to_Client", "Date_Transmitted", "Transmitted_Date"],
    suspension_released: &["Suspension_Released", "Released_Date"],
    completed: &["Completed", "Is_Completed"],
    text: &[
        ("name", &["Project_Name", "Name"]),
        ("number", &["Project_Number", "Job_Number"]),
        ("account", &["Account_Name", "Account", "Client"]),
        ("account_type", &["Account_Type"]),
        ("project_type", &["Project_Type", "Type"]),
        ("manager", &["Project_Manager", "Manager"]),
        ("city", &["City"]),
        ("state", &["State"]),
    ],
};

pub static RESOURCE: FieldProfile = FieldProfile {
    id: ID,
    address: &["Home_Address", "Address", "address"],
    latitude: LATITUDE,
    longitude: LONGITUDE,
    cancelled: &["Inactive"],
    cancellation_date: &["Inactive_Date", "Termination_Date"],
    suspended: &["Suspended_Date"],
    transmitted: &[],
    suspension_released: &["Reinstated_Date"],
    completed: &[],
    text: &[
        ("name", &["Full_Name", "Resource_Name", "Name"]),
        ("role", &["Role", "Position", "Title"]),
        ("email", &["Email"]),
        ("phone", &["Phone", "Mobile"]),
        ("city", &["City"]),
        ("state", &["State"]),
    ],
};

pub static BILLING_LOCATION: FieldProfile = FieldProfile {
    id: ID,
    address: &["Billing_Address", "Address", "address"],
    latitude: LATITUDE,
    longitude: LONGITUDE,
    cancelled: &["Inactive"],
    cancellation_date: &["Inactive_Date"],
    suspended: &[],
    transmitted: &[],
    suspension_released: &[],
    completed: &[],
    text: &[
        ("name", &["Location_Name", "Name"]),
        ("account", &["Account_Name", "Account"]),
        ("account_type", &["Account_Type"]),
        ("city", &["City"]),
        ("state", &["State"]),
    ],
};

/// Profile for an entity type.
pub fn profile(entity_type: EntityType) -> &'static FieldProfile {
    match entity_type {
        EntityType::Project => &PROJECT,
        EntityType::Resource => &RESOURCE,
        EntityType::BillingLocation => &BILLING_LOCATION,
    }
}

impl FieldProfile {
    /// Every raw key consumed by a canonical field.
    pub fn consumed_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        [self.id, self.address, self.latitude, self.longitude]
            .into_iter()
            .flatten()
            .chain(self.text.iter().flat_map(|(_, keys)| keys.iter()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_unique() {
        for entity_type in EntityType::ALL {
            let p = profile(entity_type);
            let mut names: Vec<_> = p.text.iter().map(|(name, _)| *name).collect();
            names.push("address");
            let before = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate canonical field in {entity_type}");
        }
    }

    #[test]
    fn test_consumed_keys_cover_location() {
        let keys: Vec<_> = PROJECT.consumed_keys().collect();
        assert!(keys.contains(&"ID"));
        assert!(keys.contains(&"Latitude"));
        assert!(keys.contains(&"Project_Name"));
        assert!(!keys.contains(&"Completed"));
    }
}
