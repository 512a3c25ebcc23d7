use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use crate::error::AppError;

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ShiftRole {
        Server => "Server",
        Cook => "Cook",
        Bartender => "Bartender",
        Host => "Host",
        Manager => "Manager",
        Dishwasher => "Dishwasher",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub employee_name: String,
    pub role: ShiftRole,
    pub notes: String,
    /// Id of the user in the same location who created the shift
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub employee_name: String,
    pub role: ShiftRole,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ShiftInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let missing = [
            ("startTime", &self.start_time),
            ("endTime", &self.end_time),
            ("employeeName", &self.employee_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "All required fields must be provided (missing: {})",
                missing.join(", ")
            )))
        }
    }
}

/// Partial update; absent or empty fields keep their stored value, except
/// `notes`, which may be cleared with an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdate {
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub employee_name: Option<String>,
    pub role: Option<ShiftRole>,
    pub notes: Option<String>,
}

impl ShiftUpdate {
    pub(crate) fn normalized(self) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            date: self.date,
            start_time: non_empty(self.start_time),
            end_time: non_empty(self.end_time),
            employee_name: non_empty(self.employee_name),
            role: self.role,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ShiftRangeQuery {
    /// Both bounds, inclusive, with `start <= end`.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start <= end => Ok((start, end)),
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "End date must not be before start date".to_string(),
            )),
            _ => Err(AppError::BadRequest(
                "Start date and end date are required".to_string(),
            )),
        }
    }
}
