use super::config::{resolve_config_path, SimpleSignConfig};
use simplesign::modules::{list_modules, BUILTIN_MODULES};

/// List the names `run -m` accepts
pub fn execute(config_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimpleSignConfig::load_or_create(&resolve_config_path(config_path))?;

    println!("Modules (from {}):", config.modules.dir.display());
    for name in list_modules(&config.modules.dir) {
        if BUILTIN_MODULES.contains(&name.as_str()) {
            println!("  {} (built-in)", name);
        } else {
            println!("  {}", name);
        }
    }

    Ok(())
}
