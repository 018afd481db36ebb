use anyhow::Result;
use colored::*;
use rbac_app::App;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Decision<'a> {
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permission: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    allowed: bool,
}

/// Enforce a raw `(subject, path, action)` request
pub async fn resource(
    app: &App,
    subject: &str,
    path: &str,
    action: &str,
    format: &str,
) -> Result<bool> {
    let allowed = app.engine().enforce(subject, path, action).await;
    let decision = Decision {
        subject,
        permission: None,
        resource: Some(path),
        action: Some(action),
        allowed,
    };
    print_decision(&decision, &format!("{} {} {}", subject, action, path), format)?;
    Ok(allowed)
}

/// Check a declared `resource:verb` permission code
pub async fn permission(app: &App, user: &str, code: &str, format: &str) -> Result<bool> {
    let allowed = app.authorize(user, code).await;
    let decision = Decision {
        subject: user,
        permission: Some(code),
        resource: None,
        action: None,
        allowed,
    };
    print_decision(&decision, &format!("{} {}", user, code), format)?;
    Ok(allowed)
}

fn print_decision(decision: &Decision<'_>, summary: &str, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(decision)?);
        }
        "yaml" => {
            print!("{}", serde_yaml::to_string(decision)?);
        }
        _ => {
            let verdict = if decision.allowed {
                "ALLOW".green().bold()
            } else {
                "DENY".red().bold()
            };
            println!("{} {}", verdict, summary);
        }
    }
    Ok(())
}
