use anyhow::Result;
use colored::*;
use permissions::{PermissionNode, PermissionType};
use rbac_app::App;

/// Which part of the permission forest to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Full,
    Menu { active_only: bool },
    User(String),
}

pub async fn execute(app: &App, view: View, format: &str) -> Result<()> {
    let forest = match &view {
        View::Full => app.permission_forest().await,
        View::Menu { active_only } => app.menu_tree(*active_only).await,
        View::User(user) => app.menu_for(user).await,
    };
    let nodes = forest.to_nodes();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&nodes)?),
        "yaml" => print!("{}", serde_yaml::to_string(&nodes)?),
        _ => {
            if nodes.is_empty() {
                println!("{}", "No permissions to show".yellow());
            }
            for node in &nodes {
                print_node(node, 0);
            }
        }
    }
    Ok(())
}

fn print_node(node: &PermissionNode, depth: usize) {
    let permission = &node.permission;
    let indent = "  ".repeat(depth);

    let kind = match permission.kind {
        PermissionType::Menu => permission.kind.to_string().blue(),
        PermissionType::Api => permission.kind.to_string().magenta(),
        PermissionType::Button => permission.kind.to_string().yellow(),
    };
    let mut line = format!("{}{} [{}]", indent, permission.code.cyan(), kind);
    if let Some(pattern) = &permission.path_pattern {
        line.push_str(&format!(" {}", pattern.green()));
    }
    if !permission.active {
        line.push_str(&format!(" {}", "(inactive)".dimmed()));
    }
    println!("{}", line);

    for child in &node.children {
        print_node(child, depth + 1);
    }
}
