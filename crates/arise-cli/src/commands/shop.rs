use arise_core::{Config, SnapshotCache};
use clap::Subcommand;

use super::ledger_client;
use super::profile::print_snapshot;

#[derive(Subcommand)]
pub enum ShopAction {
    /// List items for sale
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Buy an item with gold
    Buy {
        /// Item id (see `arise shop list`)
        item_id: String,
    },
}

pub async fn run(action: ShopAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = ledger_client(&config)?;

    match action {
        ShopAction::List { json } => {
            let items = ledger.shop_items().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }
            for item in &items {
                println!("{:<20} {:>6} gold  {}", item.id, item.price, item.name);
                if !item.description.is_empty() {
                    println!("    {}", item.description);
                }
            }
        }
        ShopAction::Buy { item_id } => {
            let cache = SnapshotCache::new();
            let (receipt, snapshot) = cache
                .apply(ledger.as_ref(), ledger.buy(&item_id))
                .await?;
            println!("{}", receipt.message);
            print_snapshot(&snapshot, false)?;
        }
    }
    Ok(())
}
