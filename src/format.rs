//! Display and input helpers shared by the board and the CLI.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::ApiError;
use crate::user::Registration;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

/// `Jan 15, 2026 (Due in 3 days)` style label, relative to `now` and shown
/// in `now`'s timezone.
pub fn due_date_label<Tz: TimeZone>(due: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(due) = due else {
        return "No due date".to_string();
    };
    let local = due.with_timezone(&now.timezone());
    let formatted = local.format("%b %-d, %Y").to_string();

    let ms = (due - now.with_timezone(&Utc)).num_milliseconds();
    let days = ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0);

    match days {
        d if d < 0 => format!("{formatted} (Overdue)"),
        0 => format!("{formatted} (Due today)"),
        1 => format!("{formatted} (Due tomorrow)"),
        d if d <= 7 => format!("{formatted} (Due in {d} days)"),
        _ => formatted,
    }
}

/// Parses what the user typed in a due-date field, read in `tz`.
/// `YYYY-MM-DD HH:MM` (or with a `T`) is taken as is; a bare date means the
/// end of that day. Blank means no deadline.
pub fn parse_due_input<Tz: TimeZone>(
    raw: &str,
    tz: &Tz,
) -> Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(23, 59, 0))
        })
        .ok_or_else(|| format!("Invalid due date `{raw}`, use YYYY-MM-DD or YYYY-MM-DD HH:MM"))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .ok_or_else(|| format!("`{raw}` does not exist in the local timezone"))
}

/// The inverse of [`parse_due_input`], for pre-filling an edit form.
pub fn due_input_value<Tz: TimeZone>(due: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    due.map(|d| d.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn is_overdue(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    due.is_some_and(|d| d < now)
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn password_problems(password: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    let len = password.chars().count();
    if len < 8 {
        problems.push("Password must be at least 8 characters");
    }
    if len > 72 {
        problems.push("Password cannot be longer than 72 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        problems.push("Password must contain at least one special character");
    }
    problems
}

pub fn username_problem(username: &str) -> Option<&'static str> {
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Some("Username must be between 3 and 30 characters");
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some("Username must be alphanumeric with underscores only");
    }
    None
}

/// Every local objection to a registration, in form order.
pub fn registration_problems(registration: &Registration) -> Vec<String> {
    let mut problems = Vec::new();
    if !is_valid_email(&registration.email) {
        problems.push("Please enter a valid email address".to_string());
    }
    if let Some(problem) = username_problem(&registration.username) {
        problems.push(problem.to_string());
    }
    let name_len = registration.full_name.trim().chars().count();
    if !(1..=100).contains(&name_len) {
        problems.push("Full name must be between 1 and 100 characters".to_string());
    }
    problems.extend(
        password_problems(&registration.password)
            .into_iter()
            .map(str::to_string),
    );
    problems
}

/// The text shown to the user for a failed call.
pub fn error_message(err: &ApiError) -> String {
    match err {
        ApiError::Auth(detail) => {
            format!("{detail}. Your session may have expired, run `taskdeck login`.")
        }
        other => {
            let text = other.to_string();
            if text.is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(Duration::days(-2), "Jan 13, 2026 (Overdue)")]
    #[case(Duration::hours(-2), "Jan 15, 2026 (Due today)")]
    #[case(Duration::zero(), "Jan 15, 2026 (Due today)")]
    #[case(Duration::hours(6), "Jan 15, 2026 (Due tomorrow)")]
    #[case(Duration::hours(30), "Jan 16, 2026 (Due in 2 days)")]
    #[case(Duration::days(7), "Jan 22, 2026 (Due in 7 days)")]
    #[case(Duration::days(8), "Jan 23, 2026")]
    fn labels_relative_due_dates(#[case] offset: Duration, #[case] expected: &str) {
        assert_eq!(due_date_label(Some(now() + offset), &now()), expected);
    }

    #[test]
    fn missing_due_date_means_no_deadline() {
        assert_eq!(due_date_label(None, &now()), "No due date");
        assert!(!is_overdue(None, now()));
    }

    #[test]
    fn parses_due_inputs() {
        assert_eq!(parse_due_input("  ", &Utc), Ok(None));
        assert_eq!(
            parse_due_input("2026-02-01 09:30", &Utc).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_due_input("2026-02-01", &Utc).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 1, 23, 59, 0).unwrap())
        );
        assert!(parse_due_input("next tuesday", &Utc).is_err());
    }

    #[test]
    fn due_input_value_round_trips() {
        let due = Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap());
        let shown = due_input_value(due, &Utc);
        assert_eq!(shown, "2026-02-01 09:30");
        assert_eq!(parse_due_input(&shown, &Utc).unwrap(), due);
        assert_eq!(due_input_value(None, &Utc), "");
    }

    #[test]
    fn truncates_on_characters() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 50), "short");
    }

    #[rstest]
    #[case("ann@example.com", true)]
    #[case("ann@example", false)]
    #[case("ann example@x.io", false)]
    #[case("@x.io", false)]
    #[case("a@@x.io", false)]
    fn validates_email_shape(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(is_valid_email(email), ok);
    }

    #[test]
    fn strong_password_has_no_problems() {
        assert!(password_problems("Secur3!pass").is_empty());
        assert_eq!(password_problems("weak").len(), 4);
    }

    #[test]
    fn registration_collects_problems_in_order() {
        let problems = registration_problems(&Registration {
            email: "nope".into(),
            username: "a-b".into(),
            password: "Secur3!pass".into(),
            full_name: "Ann".into(),
        });
        assert_eq!(
            problems,
            [
                "Please enter a valid email address",
                "Username must be alphanumeric with underscores only"
            ]
        );
    }

    #[test]
    fn auth_errors_point_at_login() {
        let msg = error_message(&ApiError::Auth("Invalid authentication credentials".into()));
        assert!(msg.contains("taskdeck login"));
    }
}
