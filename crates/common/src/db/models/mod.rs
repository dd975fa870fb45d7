//! SeaORM entity models
//!
//! Reference entities, core entities, and the composite-key assignment,
//! supervision and link tables.

// Reference entities
pub mod category;
pub mod department;
pub mod domain;
pub mod faculty;
pub mod function;
pub mod production_type;
pub mod publisher;
pub mod review_speciality;
pub mod speciality;
pub mod team;

// Core entities
pub mod communication;
pub mod doctoral_student;
pub mod equipment;
pub mod laboratory;
pub mod publication;
pub mod researcher;
pub mod review;

// Assignment and supervision
pub mod assign_doctoral_student;
pub mod assign_researcher;
pub mod supervise;

// Pure link tables
pub mod has_category;
pub mod has_speciality;
pub mod publish_doctoral_student_comm;
pub mod publish_doctoral_student_pub;
pub mod publish_researcher_comm;
pub mod publish_researcher_pub;

pub use equipment::EquipmentStatus;

use serde::{Deserialize, Serialize};

/// Gender of a researcher or doctoral student
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.as_str().to_string()
    }
}
