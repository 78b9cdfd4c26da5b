//! Owner-supplied tag conventions understood by janitor rules
//!
//! ## Tag Schema
//!
//! | Tag Key | Value | Meaning |
//! |---------|-------|---------|
//! | `janitor` | `donotmark` | Never mark this resource |
//! | `janitor` | `YYYY-MM-DD` | Terminate on this date |

/// Tag key owners use to override janitor behavior
pub const JANITOR_TAG: &str = "janitor";

/// Tag value asking the janitor to never manage a resource
pub const DO_NOT_MARK: &str = "donotmark";

/// Date format of a user specified termination date (`2024-03-15`)
pub const TERMINATION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Provider state of a volume that is not attached to any instance
pub const VOLUME_AVAILABLE: &str = "available";
