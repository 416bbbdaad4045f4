use http::StatusCode;
use serde::Serialize;


/// The two checks recorded for every booking attempt. They are only
/// reported, never used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checks {
    /// "System Integrity": the booking was either created or rejected as a
    /// conflict. Everything else means the system under test misbehaved
    /// under contention.
    pub system_integrity: bool,

    /// "Booked": the booking was created.
    pub booked: bool,
}

impl Checks {
    pub const SYSTEM_INTEGRITY: &'static str = "System Integrity";
    pub const BOOKED: &'static str = "Booked";

    /// Evaluates the booking response status. `None` means no response was
    /// received at all, which fails both checks.
    pub fn evaluate(status: Option<StatusCode>) -> Self {
        Self {
            system_integrity: status
                .is_some_and(|s| s == StatusCode::CREATED || s == StatusCode::CONFLICT),
            booked: status == Some(StatusCode::CREATED),
        }
    }
}


#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::Checks;


    fn check(status: u16) -> Checks {
        Checks::evaluate(Some(StatusCode::from_u16(status).unwrap()))
    }

    #[test]
    fn integrity_only_for_created_or_conflict() {
        assert!(!check(200).system_integrity);
        assert!(check(201).system_integrity);
        assert!(check(409).system_integrity);
        assert!(!check(500).system_integrity);
        assert!(!check(400).system_integrity);
        assert!(!check(429).system_integrity);
        assert!(!check(204).system_integrity);
    }

    #[test]
    fn integrity_over_all_statuses() {
        for code in 100..=599 {
            let expected = code == 201 || code == 409;
            assert_eq!(check(code).system_integrity, expected, "status {code}");
            assert_eq!(check(code).booked, code == 201, "status {code}");
        }
    }

    #[test]
    fn no_response_fails_both() {
        assert_eq!(Checks::evaluate(None), Checks { system_integrity: false, booked: false });
    }
}
