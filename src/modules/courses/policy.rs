//! Per-operation authorization predicates for courses.
//!
//! Flat role membership plus ownership, nothing else: no hierarchy, no
//! permission engine. A failed check is always a 403, distinct from the
//! 400 a state check produces.

use uuid::Uuid;

use crate::modules::users::model::UserRole;

/// Only trainers, department heads and admins may create courses.
pub fn can_create_course(role: UserRole) -> bool {
    matches!(
        role,
        UserRole::Formateur | UserRole::Responsable | UserRole::Admin
    )
}

/// Update, delete and submit: the creator, or admin/department head.
pub fn can_modify_course(role: UserRole, actor_id: Uuid, created_by: Uuid) -> bool {
    actor_id == created_by || role.is_staff()
}

/// Start review, approve and reject: admin/department head.
pub fn can_review_course(role: UserRole) -> bool {
    role.is_staff()
}

/// Publish: admin/department head only; creatorship does not suffice.
pub fn can_publish_course(role: UserRole) -> bool {
    role.is_staff()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_limited_to_trainer_head_admin() {
        assert!(can_create_course(UserRole::Formateur));
        assert!(can_create_course(UserRole::Responsable));
        assert!(can_create_course(UserRole::Admin));

        assert!(!can_create_course(UserRole::Learner));
        assert!(!can_create_course(UserRole::Secretaire));
        assert!(!can_create_course(UserRole::Marketing));
        assert!(!can_create_course(UserRole::Parent));
    }

    #[test]
    fn test_modify_allows_creator_of_any_role() {
        let creator = Uuid::new_v4();
        assert!(can_modify_course(UserRole::Formateur, creator, creator));
        assert!(can_modify_course(UserRole::Learner, creator, creator));
    }

    #[test]
    fn test_modify_allows_staff_over_others_courses() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(can_modify_course(UserRole::Admin, other, creator));
        assert!(can_modify_course(UserRole::Responsable, other, creator));
        assert!(!can_modify_course(UserRole::Formateur, other, creator));
        assert!(!can_modify_course(UserRole::Learner, other, creator));
    }

    #[test]
    fn test_publish_requires_staff_even_for_creator() {
        assert!(can_publish_course(UserRole::Admin));
        assert!(can_publish_course(UserRole::Responsable));
        // A trainer cannot publish their own course; ownership is irrelevant.
        assert!(!can_publish_course(UserRole::Formateur));
    }

    #[test]
    fn test_review_requires_staff() {
        assert!(can_review_course(UserRole::Admin));
        assert!(can_review_course(UserRole::Responsable));
        assert!(!can_review_course(UserRole::Formateur));
        assert!(!can_review_course(UserRole::Secretaire));
    }
}
