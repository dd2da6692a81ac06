//! Output Formatting
//!
//! Rendering for the three report types (summary, users, applications) in
//! both human-readable colored form and structured JSON, plus the stderr
//! progress meter used while a file is parsed and aggregated.
//!
//! JSON output wraps each report under a top-level key:
//!
//! ```json
//! {
//!   "applications": [
//!     {"name": "Acme CRM", "userCount": 41, "sessionCount": 128}
//!   ]
//! }
//! ```

use crate::config::get_config;
use crate::models::{AppBreakdown, FilteredUser, UsageSummary};
use crate::timestamp_parser::TimestampParser;
use colored::Colorize;

pub struct ReportRenderer;

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Dataset totals plus the top applications under the active filter.
    pub fn display_summary(
        &self,
        summary: &UsageSummary,
        filtered_users: &[FilteredUser],
        filtered_apps: &[AppBreakdown],
        json_output: bool,
    ) {
        let top_apps = get_config().output.top_apps;

        if json_output {
            let top: Vec<_> = filtered_apps.iter().take(top_apps).collect();
            let output = serde_json::json!({
                "summary": {
                    "totalRecords": summary.record_count,
                    "totalUsers": summary.total_users,
                    "totalApps": summary.app_count(),
                    "dateRange": summary.date_range,
                    "filteredUsers": filtered_users.len(),
                    "topApplications": top,
                }
            });
            print_json(&output);
            return;
        }

        banner("SSO Usage Report - Summary");

        println!(
            "\n{} {} records • {} users • {} applications",
            "📊".bright_yellow(),
            summary.record_count.to_string().bright_white().bold(),
            summary.total_users.to_string().bright_white().bold(),
            summary.app_count().to_string().bright_white().bold()
        );

        match &summary.date_range {
            Some(range) => println!(
                "{} Full date range: {} to {}",
                "📅".bright_blue(),
                range.min.to_string().bright_white(),
                range.max.to_string().bright_white()
            ),
            None => println!("{} Full date range: no timestamps observed", "📅".bright_blue()),
        }

        let retention = if summary.total_users > 0 {
            format!(
                "{:.1}%",
                filtered_users.len() as f64 / summary.total_users as f64 * 100.0
            )
        } else {
            "N/A".to_string()
        };
        println!(
            "{} Filtered active users: {} ({} of all users)\n",
            "👤".bright_blue(),
            filtered_users.len().to_string().bright_white().bold(),
            retention.bright_yellow()
        );

        println!(
            "{} Top applications by unique users:",
            "🏆".bright_yellow()
        );
        if filtered_apps.is_empty() {
            println!("   (no application activity in the selected period)");
        }
        for app in filtered_apps.iter().take(top_apps) {
            println!(
                "   {}: {} users ({} sessions)",
                app.name.bright_cyan(),
                app.user_count.to_string().bright_white().bold(),
                app.session_count.to_string().bright_white()
            );
        }
    }

    /// Per-user rows under the active filter.
    pub fn display_users(&self, users: &[FilteredUser], limit: Option<usize>, json_output: bool) {
        let shown = limit.unwrap_or(users.len());

        if json_output {
            let rows: Vec<_> = users.iter().take(shown).collect();
            let output = serde_json::json!({"users": rows});
            print_json(&output);
            return;
        }

        banner("SSO Usage Report - Users by Application");

        println!(
            "\n{} {} matching users\n",
            "👤".bright_yellow(),
            users.len().to_string().bright_white().bold()
        );

        if users.is_empty() {
            println!("No matching users found");
            return;
        }

        for user in users.iter().take(shown) {
            println!(
                "{} {} — {} apps • last seen {}",
                user.username.bright_white().bold(),
                format!("({})", user.user_id).bright_black(),
                user.app_count_in_range.to_string().bright_white(),
                format_last_seen(&user.last_seen).bright_white()
            );
            println!("   {}", user.apps_in_range.join(", ").bright_cyan());
        }

        if users.len() > shown {
            println!(
                "\n... and {} more (raise --limit to see them)",
                (users.len() - shown).to_string().bright_white()
            );
        }
    }

    /// Per-application rows under the active filter, ranked by unique users.
    pub fn display_applications(
        &self,
        summary: &UsageSummary,
        apps: &[AppBreakdown],
        limit: Option<usize>,
        json_output: bool,
    ) {
        let shown = limit.unwrap_or(apps.len());

        if json_output {
            let rows: Vec<_> = apps.iter().take(shown).collect();
            let output = serde_json::json!({"applications": rows});
            print_json(&output);
            return;
        }

        banner("SSO Usage Report - Applications by Unique Users");

        println!(
            "\n{} {} applications with activity\n",
            "🏆".bright_yellow(),
            apps.len().to_string().bright_white().bold()
        );

        if apps.is_empty() {
            println!("No application data available for selected period");
            return;
        }

        for app in apps.iter().take(shown) {
            let sessions_per_user = if app.user_count > 0 {
                format!("{:.1}", app.session_count as f64 / app.user_count as f64)
            } else {
                "N/A".to_string()
            };
            let percent_of_users = if summary.total_users > 0 {
                format!(
                    "{:.1}",
                    app.user_count as f64 / summary.total_users as f64 * 100.0
                )
            } else {
                "0.0".to_string()
            };
            println!(
                "{}: {} users • {} sessions ({} sessions/user, {}% of all users)",
                app.name.bright_cyan(),
                app.user_count.to_string().bright_white().bold(),
                app.session_count.to_string().bright_white(),
                sessions_per_user.bright_white(),
                percent_of_users.bright_yellow()
            );
        }
    }
}

/// Progress callback writing an in-place percentage to stderr. Repeated
/// values are dropped so a fine-grained batch loop does not spam the
/// terminal; the line is closed when 100 is reached.
pub fn progress_meter(label: &'static str, enabled: bool) -> impl FnMut(u8) {
    let mut last_shown: Option<u8> = None;
    move |percent| {
        if !enabled || last_shown == Some(percent) {
            return;
        }
        last_shown = Some(percent);
        eprint!("\r{} {}%", label.bright_blue(), percent);
        if percent >= 100 {
            eprintln!();
        }
    }
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(80).bright_cyan());
    println!("{}", title.bright_white().bold());
    println!("{}", "=".repeat(80).bright_cyan());
}

fn print_json(output: &serde_json::Value) {
    match serde_json::to_string_pretty(output) {
        Ok(json_str) => println!("{}", json_str),
        Err(e) => eprintln!("Error serializing report to JSON: {}", e),
    }
}

fn format_last_seen(raw: &str) -> String {
    match TimestampParser::parse(raw) {
        Ok(at) => at
            .format(&get_config().output.timestamp_format)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
