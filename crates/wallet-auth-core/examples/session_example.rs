/*
[INPUT]:  Throwaway EVM key and a simulated popup window
[OUTPUT]: Signed auth result as the opener would receive it
[POS]:    Examples - session flow demonstration
[UPDATE]: When session flow changes
*/

use std::sync::Arc;

use wallet_auth_core::*;

/// Example: popup authentication flow
///
/// 1. Build a host window that was opened by another page
/// 2. Connect a local-key wallet
/// 3. Sign the challenge
/// 4. Print the message posted back to the opener
#[tokio::main]
async fn main() {
    println!("=== Wallet Auth Session Example ===\n");

    let connector = match LocalKeyConnector::new(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        1,
    ) {
        Ok(c) => c.with_connector_id("metaMask"),
        Err(e) => {
            eprintln!("Failed to create connector: {}", e);
            return;
        }
    };
    println!("✓ Wallet ready: {}", connector.address());

    let host = Arc::new(MockHost::new(
        RuntimeInfo::top_level("Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0 Safari/537.36")
            .with_opener(WindowRef::Other),
    ));
    let config = BridgeConfig {
        app_name: "Example App".to_string(),
        success_delay_ms: 0,
        ..BridgeConfig::default()
    };

    let mut machine = AuthSessionMachine::new(
        &config,
        Arc::new(connector),
        host.clone(),
        Arc::new(MemoryStorage::new()),
    );
    machine.select_wallet("metaMask").await;
    println!("✓ Session finished in step {:?}", machine.step());

    for (target, message, origin) in host.posted() {
        println!("\nPosted to {:?} (targetOrigin {}):", target, origin);
        match serde_json::to_string_pretty(&message) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to render message: {}", e),
        }
    }
}
