use anyhow::Result;
use authz::{PolicyRule, RoleBinding, RoleInheritance};
use colored::*;
use rbac_app::App;
use serde_json::json;

/// List every rule, binding and inheritance edge
pub async fn execute(app: &App, format: &str) -> Result<()> {
    let engine = app.engine();
    let policies = engine.policies().await;
    let bindings = engine.bindings().await;
    let inheritance = engine.inheritance().await;

    match format {
        "json" | "yaml" => {
            let state = json!({
                "policies": policies,
                "bindings": bindings,
                "inheritance": inheritance,
            });
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print!("{}", serde_yaml::to_string(&state)?);
            }
        }
        _ => print_policies_text(&policies, &bindings, &inheritance),
    }
    Ok(())
}

fn print_policies_text(
    policies: &[PolicyRule],
    bindings: &[RoleBinding],
    inheritance: &[RoleInheritance],
) {
    println!("{}", "=== Policies ===".bold());
    for rule in policies {
        println!("  {}", rule);
    }
    println!();

    println!("{}", "=== Role bindings ===".bold());
    if bindings.is_empty() {
        println!("  {}", "none".yellow());
    }
    for binding in bindings {
        println!("  {} -> {}", binding.user_id.cyan(), binding.role_code);
    }
    println!();

    if !inheritance.is_empty() {
        println!("{}", "=== Role inheritance ===".bold());
        for edge in inheritance {
            println!("  {} inherits {}", edge.role.cyan(), edge.inherits);
        }
        println!();
    }

    println!(
        "{}",
        format!(
            "Total: {} policies, {} bindings",
            policies.len(),
            bindings.len()
        )
        .green()
    );
}
