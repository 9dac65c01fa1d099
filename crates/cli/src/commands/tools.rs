//! `smartflow tools`: List the tools the agent can call.

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = smartflow_tools::default_registry();

    println!("Registered tools ({})", registry.len());
    for def in registry.definitions() {
        println!("  {:<16} {}", def.name, def.description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn registry_is_not_empty() {
        assert!(!smartflow_tools::default_registry().is_empty());
    }
}
