//! `corvid modules` — List the linked dialog modules.

pub fn run() {
    let registry = corvid_modules::default_registry();
    println!("{} module(s) linked:", registry.len());
    for name in registry.names() {
        let Some(module) = registry.get(name) else {
            continue;
        };
        let env: Vec<String> = module
            .env_vars()
            .iter()
            .map(|v| format!("{name}_{v}").to_uppercase())
            .collect();
        if env.is_empty() {
            println!("  {name}");
        } else {
            println!("  {name} (env: {})", env.join(", "));
        }
    }
}
