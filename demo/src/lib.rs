//! Walk-through of the user API: one call per operation, in order.
//!
//! The sequence mirrors what an operator would try by hand against a fresh
//! installation: check the key, read the counters, create a sample user,
//! list and search, read it back, change its bandwidth. Deleting the sample
//! user is opt-in so a rerun finds it again.

use std::io::{self, Write};

use radius_core::{NewUser, RadiusApi, Record, Transport, UserQuery, UserUpdate};
use serde_json::Value;
use tracing::info;

pub const PLACEHOLDER_URL: &str = "http://192.168.1.100/radius-api.php";
pub const PLACEHOLDER_KEY: &str = "your-secret-api-key";

pub const SAMPLE_USERNAME: &str = "cliente1@fibra";
pub const SAMPLE_SEARCH: &str = "cliente1";
const LIST_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Remove the sample user at the end.
    pub delete_sample: bool,
}

/// Counter values may arrive as numbers or as numeric strings.
fn counter(stats: &Record, key: &str) -> String {
    match stats.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "0".to_string(),
        Some(other) => other.to_string(),
    }
}

fn username(user: &Record) -> &str {
    user.get("username").and_then(Value::as_str).unwrap_or("?")
}

/// Run the walk-through, writing progress to `out`.
///
/// The create, update and delete notices go to the api's notice sink. Build
/// the api with `with_notices` on the same writer to capture one transcript.
///
/// Returns `Ok(false)` without making further calls when the connectivity
/// check fails.
pub fn run<T: Transport>(
    api: &RadiusApi<T>,
    options: &DemoOptions,
    out: &mut impl Write,
) -> io::Result<bool> {
    info!(base_url = api.client().base_url(), "starting demo");

    writeln!(out, "🔄 Checking connection to the API...")?;
    if !api.login() {
        writeln!(out, "❌ Could not connect to the API. Check the URL and API key.")?;
        return Ok(false);
    }
    writeln!(out, "✅ Connected!\n")?;

    writeln!(out, "📊 Statistics:")?;
    let stats = api.get_stats();
    writeln!(out, "   Total users: {}", counter(&stats, "total_users"))?;
    writeln!(out, "   Active sessions: {}\n", counter(&stats, "active_sessions"))?;

    writeln!(out, "➕ Creating sample user...")?;
    let sample = NewUser::new(SAMPLE_USERNAME, "password123")
        .bandwidth("50M", "50M")
        .profile("default");
    api.create_user(&sample);
    writeln!(out)?;

    writeln!(out, "📋 Listing first {LIST_LIMIT} users:")?;
    for user in api.list_users(&UserQuery::page(LIST_LIMIT, 0)) {
        writeln!(out, "   - {}", username(&user))?;
    }
    writeln!(out)?;

    writeln!(out, "🔍 Searching for '{SAMPLE_SEARCH}'...")?;
    if let Some(first) = api.list_users(&UserQuery::search(SAMPLE_SEARCH)).first() {
        writeln!(out, "   Found: {}", username(first))?;
    }
    writeln!(out)?;

    writeln!(out, "📄 Fetching details for '{SAMPLE_USERNAME}'...")?;
    if let Some(details) = api.get_user(SAMPLE_USERNAME) {
        let attributes = details
            .get("check")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        writeln!(out, "   User found with {attributes} attributes")?;
    }
    writeln!(out)?;

    writeln!(out, "✏️ Updating user bandwidth...")?;
    let update = UserUpdate::new(SAMPLE_USERNAME)
        .bandwidth_up("100M")
        .bandwidth_down("100M");
    api.update_user(&update);
    writeln!(out)?;

    if options.delete_sample {
        writeln!(out, "🗑️ Deleting sample user...")?;
        api.delete_user(SAMPLE_USERNAME);
        writeln!(out)?;
    }

    writeln!(out, "✅ Examples completed!")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn counter_accepts_numbers_and_strings() {
        let stats = json!({ "total_users": "7", "active_sessions": 2 });
        let stats = stats.as_object().unwrap();
        assert_eq!(counter(stats, "total_users"), "7");
        assert_eq!(counter(stats, "active_sessions"), "2");
        assert_eq!(counter(stats, "missing"), "0");
    }

    #[test]
    fn username_falls_back_when_missing() {
        let user = json!({ "id": 1 });
        assert_eq!(username(user.as_object().unwrap()), "?");
    }
}
