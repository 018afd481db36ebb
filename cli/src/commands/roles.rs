use anyhow::Result;
use colored::*;
use rbac_app::App;
use serde_json::json;
use std::collections::BTreeSet;

/// Print the direct and effective roles of a user
pub async fn execute(app: &App, user: &str, format: &str) -> Result<()> {
    let direct = app.engine().roles_of(user).await;
    let effective = app.engine().effective_roles(user).await;
    let superuser = effective.contains(app.engine().superuser_role());

    let report = json!({
        "user": user,
        "direct": direct,
        "effective": effective,
        "superuser": superuser,
    });

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "yaml" => print!("{}", serde_yaml::to_string(&report)?),
        _ => print_roles_text(user, &direct, &effective, superuser),
    }
    Ok(())
}

fn print_roles_text(
    user: &str,
    direct: &BTreeSet<String>,
    effective: &BTreeSet<String>,
    superuser: bool,
) {
    println!("{}", format!("=== Roles of {} ===", user).bold());
    println!();

    if effective.is_empty() {
        println!("{}", "No roles bound".yellow());
        return;
    }

    for role in effective {
        if direct.contains(role) {
            println!("  {}", role.cyan());
        } else {
            println!("  {} {}", role.cyan(), "(inherited)".dimmed());
        }
    }

    if superuser {
        println!();
        println!("{}", "Superuser: every request is allowed".green());
    }
}
