use crate::commands::demo_registry;

pub fn run() -> anyhow::Result<()> {
    for provider in demo_registry().list_available() {
        println!("{:<12} {}  -  {}", provider.id, provider.display_name, provider.description);
    }
    Ok(())
}
