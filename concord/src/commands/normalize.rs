// concord/src/commands/normalize.rs
//
// USE CASE: Show the canonical form of identifiers, one per line.

use concord_core::domain::identity::normalize;

pub fn execute(identifiers: Vec<String>) -> anyhow::Result<()> {
    let mut invalid = 0;
    for identifier in &identifiers {
        match normalize(identifier) {
            Ok(canonical) => println!("{}\t{}", identifier, canonical),
            Err(e) => {
                eprintln!("{:?}\t❌ {}", identifier, e);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}
