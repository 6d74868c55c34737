// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use routebind_domain::{Binding, BindingView, CompositeKey, parse_effective_date};
use time::Date;

use crate::diesel_schema::route_bindings;
use crate::error::PersistenceError;

/// Diesel Queryable struct for `route_bindings` rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = route_bindings)]
pub struct BindingRow {
    pub binding_id: i64,
    pub branch_id: i64,
    pub sub_branch_id: i64,
    pub delivery_route_id: i64,
    pub delivery_route_no: String,
    pub correct_description_for_reports: String,
    pub effective_date: String,
    pub required_reports_flag: i32,
}

/// Reference columns joined onto a binding row for display.
pub type ViewColumns = (
    BindingRow,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
);

fn stored_date(binding_id: i64, value: &str) -> Result<Date, PersistenceError> {
    parse_effective_date(value).map_err(|e| {
        PersistenceError::InvalidStoredValue(format!("binding {binding_id}: {e}"))
    })
}

impl BindingRow {
    /// Converts a stored row into the engine's binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored effective date is malformed.
    pub fn into_binding(self) -> Result<Binding, PersistenceError> {
        let effective_date: Date = stored_date(self.binding_id, &self.effective_date)?;
        Ok(Binding {
            binding_id: self.binding_id,
            key: CompositeKey::new(self.branch_id, self.sub_branch_id, self.delivery_route_id),
            route_no: self.delivery_route_no,
            description: self.correct_description_for_reports,
            effective_date,
            active: self.required_reports_flag != 0,
        })
    }
}

/// Builds the display form of a binding from its joined columns.
///
/// # Errors
///
/// Returns an error if the stored effective date is malformed.
pub fn into_view(columns: ViewColumns) -> Result<BindingView, PersistenceError> {
    let (row, branch_name, branch_desc, sub_branch_name, sub_branch_desc, route_description) =
        columns;
    let effective_date: Date = stored_date(row.binding_id, &row.effective_date)?;

    Ok(BindingView {
        binding_id: row.binding_id,
        branch_id: row.branch_id,
        branch_name,
        branch_desc,
        sub_branch_id: row.sub_branch_id,
        sub_branch_name,
        sub_branch_desc,
        delivery_route_id: row.delivery_route_id,
        delivery_route_no: row.delivery_route_no,
        delivery_route_description: route_description,
        description: row.correct_description_for_reports,
        effective_date,
        active: row.required_reports_flag != 0,
    })
}
