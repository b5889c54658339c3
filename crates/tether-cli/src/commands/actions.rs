use anyhow::bail;

use tether_connector::Connector;

use crate::commands::demo_registry;

pub fn run(provider: &str) -> anyhow::Result<()> {
    let registry = demo_registry();
    let Some(connector) = registry.lookup(provider) else {
        bail!("unknown provider: {provider}");
    };

    for action in connector.declared_actions() {
        println!(
            "{:<38} auth={:<10} risk={:<5} rollback={:?}",
            action.id,
            format!("{:?}", action.auth_level),
            format!("{:?}", action.risk),
            action.rollback,
        );
        for limitation in &action.limitations {
            println!("{:<38} - {}", "", limitation);
        }
    }
    Ok(())
}
