use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use validator::Validate;

use super::validation::not_blank;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TrainingCourse {
    pub id: i64,
    pub course_title: String,
    pub region: Option<String>,
    pub delivery_mode: Option<String>,
    pub start_date: Option<Date>,
    pub duration_days: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTrainingCourse {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub course_title: String,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(length(max = 50))]
    pub delivery_mode: Option<String>,
    pub start_date: Option<Date>,
    #[validate(range(min = 1))]
    pub duration_days: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    pub delivery_mode: Option<String>,
    pub region: Option<String>,
    #[serde(skip)]
    pub limit: Option<i64>,
}
