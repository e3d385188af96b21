//! # Farmer Registry
//!
//! Supplier records. A farmer's `region` names the raw inventory category
//! that its purchases are credited to, so saving a farmer also makes sure
//! that category exists in the raw ledger (done by the tracker).
//!
//! Deleting a farmer does not cascade: existing purchases keep their
//! `farmer_id` and simply stop resolving.

use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::types::{Farmer, Upsert};
use crate::validation::{validate_email, validate_phone, validate_required};

#[derive(Debug, Clone, Default)]
pub struct FarmerRegistry {
    farmers: Vec<Farmer>,
}

impl FarmerRegistry {
    pub fn from_records(farmers: Vec<Farmer>) -> Self {
        FarmerRegistry { farmers }
    }

    pub fn records(&self) -> &[Farmer] {
        &self.farmers
    }

    pub fn len(&self) -> usize {
        self.farmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.farmers.is_empty()
    }

    pub fn get(&self, farmer_id: &str) -> Option<&Farmer> {
        self.farmers.iter().find(|f| f.farmer_id == farmer_id)
    }

    /// Farmer regions in registry order (may repeat).
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.farmers.iter().map(|f| f.region.as_str())
    }

    /// Creates or updates a farmer.
    ///
    /// ## Rules
    /// - every field is required
    /// - phone: 7-15 characters of digits, `+` or `-`
    /// - email: `local@domain.tld`
    pub fn upsert(&mut self, farmer: Farmer) -> CoreResult<Upsert> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("Farmer ID", &farmer.farmer_id));
        errors.check(validate_required("Name", &farmer.name));
        errors.check(validate_phone("Phone", &farmer.phone));
        errors.check(validate_email("Email", &farmer.email));
        errors.check(validate_required("Address", &farmer.address));
        errors.check(validate_required("Region", &farmer.region));
        errors.check(validate_required("GPS", &farmer.gps));
        errors.into_result()?;

        let farmer = Farmer {
            farmer_id: farmer.farmer_id.trim().to_string(),
            region: farmer.region.trim().to_string(),
            ..farmer
        };

        match self
            .farmers
            .iter_mut()
            .find(|f| f.farmer_id == farmer.farmer_id)
        {
            Some(existing) => {
                debug!(farmer_id = %farmer.farmer_id, "Farmer updated");
                *existing = farmer;
                Ok(Upsert::Updated)
            }
            None => {
                debug!(farmer_id = %farmer.farmer_id, "Farmer created");
                self.farmers.push(farmer);
                Ok(Upsert::Created)
            }
        }
    }

    pub fn remove(&mut self, farmer_id: &str) -> CoreResult<Farmer> {
        let index = self
            .farmers
            .iter()
            .position(|f| f.farmer_id == farmer_id)
            .ok_or_else(|| CoreError::not_found("Farmer", farmer_id))?;

        debug!(farmer_id = %farmer_id, "Farmer removed");
        Ok(self.farmers.remove(index))
    }

    /// Case-insensitive substring match on name, region or id.
    ///
    /// An empty query returns everyone.
    pub fn search(&self, query: &str) -> Vec<&Farmer> {
        let needle = query.trim().to_lowercase();
        self.farmers
            .iter()
            .filter(|f| {
                needle.is_empty()
                    || f.name.to_lowercase().contains(&needle)
                    || f.region.to_lowercase().contains(&needle)
                    || f.farmer_id.to_lowercase().contains(&needle)
            })
            .collect()
    }
}
