//! The course state machine, as pure functions.
//!
//! Transition legality and submission validation are decided here on a
//! course snapshot; the service layer enforces the decision atomically
//! with a compare-and-set write on `status`.

use chrono::{DateTime, Utc};

use crate::utils::errors::AppError;

use super::model::{Course, CourseStatus};

impl CourseStatus {
    /// States reachable from `self` in one transition.
    pub fn allowed_transitions(self) -> &'static [CourseStatus] {
        match self {
            CourseStatus::Draft => &[CourseStatus::Submitted],
            CourseStatus::Submitted => &[CourseStatus::UnderReview],
            CourseStatus::UnderReview => &[CourseStatus::Approved, CourseStatus::Rejected],
            CourseStatus::Approved => &[CourseStatus::Published],
            CourseStatus::Rejected => &[],
            CourseStatus::Published => &[],
        }
    }

    pub fn can_transition_to(self, next: CourseStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

/// Validate that a course may be submitted at `now`.
///
/// Deadline comparison is strict: submission at exactly the deadline still
/// passes, a missing deadline never blocks.
pub fn validate_submission(course: &Course, now: DateTime<Utc>) -> Result<(), AppError> {
    if course.status != CourseStatus::Draft {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Only draft courses can be submitted"
        )));
    }

    if let Some(deadline) = course.submission_deadline {
        if now > deadline {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Submission deadline has passed"
            )));
        }
    }

    let required = [
        ("title", &course.title),
        ("description", &course.description),
        ("objectives", &course.objectives),
        ("contents", &course.contents),
        ("duration", &course.duration),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "All required fields must be completed before submission: {} is empty",
                field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::courses::model::SupplierType;
    use axum::http::StatusCode;
    use chrono::Duration;
    use uuid::Uuid;

    fn complete_course(status: CourseStatus) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Intro to French".to_string(),
            description: "A beginner course".to_string(),
            supplier_type: SupplierType::Internal,
            status,
            objectives: "Read and write basic French".to_string(),
            contents: "Grammar, vocabulary".to_string(),
            duration: "8 weeks".to_string(),
            expected_income: "1000".to_string(),
            links: String::new(),
            summary_path: None,
            submission_deadline: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_transition_graph_is_exact() {
        use CourseStatus::*;

        let all = [Draft, Submitted, UnderReview, Approved, Rejected, Published];
        let expect = |from: CourseStatus, allowed: &[CourseStatus]| {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        };

        expect(Draft, &[Submitted]);
        expect(Submitted, &[UnderReview]);
        expect(UnderReview, &[Approved, Rejected]);
        expect(Approved, &[Published]);
        expect(Rejected, &[]);
        expect(Published, &[]);
    }

    #[test]
    fn test_submission_of_complete_draft_passes() {
        let course = complete_course(CourseStatus::Draft);
        assert!(validate_submission(&course, Utc::now()).is_ok());
    }

    #[test]
    fn test_submission_rejected_outside_draft() {
        for status in [
            CourseStatus::Submitted,
            CourseStatus::UnderReview,
            CourseStatus::Approved,
            CourseStatus::Rejected,
            CourseStatus::Published,
        ] {
            let course = complete_course(status);
            let err = validate_submission(&course, Utc::now()).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_submission_rejected_after_deadline() {
        let now = Utc::now();
        let mut course = complete_course(CourseStatus::Draft);
        course.submission_deadline = Some(now - Duration::days(1));

        let err = validate_submission(&course, now).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("deadline"));
    }

    #[test]
    fn test_submission_at_exact_deadline_passes() {
        let now = Utc::now();
        let mut course = complete_course(CourseStatus::Draft);
        course.submission_deadline = Some(now);

        assert!(validate_submission(&course, now).is_ok());
    }

    #[test]
    fn test_submission_with_future_deadline_passes() {
        let now = Utc::now();
        let mut course = complete_course(CourseStatus::Draft);
        course.submission_deadline = Some(now + Duration::days(1));

        assert!(validate_submission(&course, now).is_ok());
    }

    #[test]
    fn test_submission_rejected_when_required_field_blank() {
        let blank_each = [
            |c: &mut Course| c.title = String::new(),
            |c: &mut Course| c.description = "   ".to_string(),
            |c: &mut Course| c.objectives = String::new(),
            |c: &mut Course| c.contents = String::new(),
            |c: &mut Course| c.duration = String::new(),
        ];
        for blank in blank_each {
            let mut course = complete_course(CourseStatus::Draft);
            blank(&mut course);
            let err = validate_submission(&course, Utc::now()).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_optional_fields_do_not_block_submission() {
        let mut course = complete_course(CourseStatus::Draft);
        course.expected_income = String::new();
        course.links = String::new();
        assert!(validate_submission(&course, Utc::now()).is_ok());
    }
}
