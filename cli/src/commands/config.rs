use anyhow::{anyhow, Result};
use colored::*;
use rbac_app::AppConfig;

/// Print the effective configuration
pub fn show(config: &AppConfig, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        "yaml" => print!("{}", serde_yaml::to_string(config)?),
        _ => {
            println!("{}", "=== RBAC Configuration ===".bold());
            println!();
            print_yaml_value(&serde_yaml::to_value(config)?, 0);
        }
    }
    Ok(())
}

/// Print one configuration value addressed by a dotted key path
pub fn get(config: &AppConfig, key: &str, format: &str) -> Result<()> {
    let root = serde_yaml::to_value(config)?;
    let parts: Vec<&str> = key.split('.').collect();
    let value = navigate_config_path(&root, &parts)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&value)?),
        "yaml" => print!("{}", serde_yaml::to_string(&value)?),
        _ => print_yaml_value(&value, 0),
    }
    Ok(())
}

/// Walk a dotted key path through nested mappings
fn navigate_config_path(root: &serde_yaml::Value, path: &[&str]) -> Result<serde_yaml::Value> {
    if path.iter().any(|key| key.is_empty()) {
        return Err(anyhow!("Empty configuration key"));
    }

    let mut current = root;
    for (i, &key) in path.iter().enumerate() {
        let serde_yaml::Value::Mapping(map) = current else {
            return Err(anyhow!(
                "Cannot navigate further from '{}': not a mapping",
                path[..i].join(".")
            ));
        };
        current = map
            .get(key)
            .ok_or_else(|| anyhow!("Configuration key '{}' not found", path[..=i].join(".")))?;
    }

    Ok(current.clone())
}

/// Recursively print a YAML value with indentation
fn print_yaml_value(value: &serde_yaml::Value, indent_level: usize) {
    let indent = "  ".repeat(indent_level);

    match value {
        serde_yaml::Value::Null => println!("{}{}", indent, "~".dimmed()),
        serde_yaml::Value::Bool(b) => println!("{}{}", indent, b.to_string().blue()),
        serde_yaml::Value::Number(n) => println!("{}{}", indent, n.to_string().magenta()),
        serde_yaml::Value::String(s) => {
            // Paths stand out from plain values
            if s.contains('/') || s.contains('\\') {
                println!("{}{}", indent, s.green());
            } else {
                println!("{}{}", indent, s.yellow());
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                println!("{}-", indent);
                print_yaml_value(item, indent_level + 1);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                let key = key.as_str().unwrap_or("?");
                match val {
                    serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_) => {
                        println!("{}{}:", indent, key.cyan());
                        print_yaml_value(val, indent_level + 1);
                    }
                    _ => {
                        print!("{}{}: ", indent, key.cyan());
                        print_yaml_value(val, 0);
                    }
                }
            }
        }
        serde_yaml::Value::Tagged(tagged) => {
            println!("{}!{}", indent, tagged.tag);
            print_yaml_value(&tagged.value, indent_level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_config_path() {
        let root = serde_yaml::to_value(AppConfig::default()).unwrap();

        let level = navigate_config_path(&root, &["logging", "level"]).unwrap();
        assert_eq!(level, serde_yaml::Value::String("info".to_string()));

        let superuser = navigate_config_path(&root, &["superuser_role"]).unwrap();
        assert_eq!(superuser.as_str(), Some("admin"));

        let err = navigate_config_path(&root, &["logging", "missing"]).unwrap_err();
        assert!(err.to_string().contains("logging.missing"));

        let err = navigate_config_path(&root, &["bootstrap", "deeper"]).unwrap_err();
        assert!(err.to_string().contains("not a mapping"));

        assert!(navigate_config_path(&root, &[""]).is_err());
    }
}
