//! `corvid rules` — Validate a rule file and dump the parsed catalog.

pub fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = corvid_rules::load(path)?;

    println!("{}", serde_json::to_string_pretty(&catalog)?);
    eprintln!("{path}: OK ({} rules)", catalog.rules.len());
    Ok(())
}
