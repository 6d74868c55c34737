// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use routebind_domain::{RawBulkRow, RawValue};
use routebind_persistence::Persistence;
use time::Date;
use time::macros::date;

use crate::BindingRequest;

pub const TODAY: Date = date!(2026 - 10 - 17);

pub struct Seeded {
    pub persistence: Persistence,
    pub branch_id: i64,
    pub sub_branch_id: i64,
    pub route_id: i64,
    pub other_route_id: i64,
    pub foreign_route_id: i64,
}

/// One branch with one sub-branch and two routes, plus a second branch
/// owning a third route.
pub fn create_seeded_persistence() -> Seeded {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let branch_id: i64 = persistence
        .create_branch("Central", Some("Central depot"))
        .unwrap();
    let other_branch_id: i64 = persistence.create_branch("East", None).unwrap();
    let sub_branch_id: i64 = persistence
        .create_sub_branch(branch_id, "Central-1", None)
        .unwrap();
    let route_id: i64 = persistence
        .create_delivery_route(branch_id, "C-7", Some("Market loop"))
        .unwrap();
    let other_route_id: i64 = persistence
        .create_delivery_route(branch_id, "C-8", None)
        .unwrap();
    let foreign_route_id: i64 = persistence
        .create_delivery_route(other_branch_id, "E-1", None)
        .unwrap();

    Seeded {
        persistence,
        branch_id,
        sub_branch_id,
        route_id,
        other_route_id,
        foreign_route_id,
    }
}

impl Seeded {
    pub fn request(&self, effective_date: &str) -> BindingRequest {
        BindingRequest {
            branch_id: Some(self.branch_id),
            sub_branch_id: Some(self.sub_branch_id),
            delivery_route_id: Some(self.route_id),
            effective_date: Some(effective_date.to_string()),
            required_reports_flag: None,
            correct_description_for_reports: Some(String::from("Market day")),
            force: false,
        }
    }

    pub fn bulk_row(&self, route_id: i64, effective_date: &str) -> RawBulkRow {
        RawBulkRow {
            branch_id: Some(RawValue::Integer(self.branch_id)),
            sub_branch_id: Some(RawValue::Integer(self.sub_branch_id)),
            delivery_route_id: Some(RawValue::Integer(route_id)),
            effective_date: Some(effective_date.to_string()),
            required_reports_flag: Some(RawValue::Integer(1)),
            correct_description_for_reports: Some(String::from("Bulk row")),
        }
    }
}
