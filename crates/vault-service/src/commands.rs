//! One-shot CLI commands.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use vault_core::{format_eth, Storefront, StorefrontView};
use vault_types::PurchaseQuote;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn print_packages(view: &StorefrontView) {
	for entry in &view.packages {
		let price = entry.display_total.as_deref().unwrap_or("price unavailable");
		let popular = if entry.package.popular { "  *popular*" } else { "" };
		println!(
			"  #{:<3} {:>4} leads  {:<8} {}{}",
			entry.package.id,
			entry.package.lead_count,
			entry.tier.as_str(),
			price,
			popular
		);
	}
}

fn print_leads(view: &StorefrontView) {
	if view.leads.is_empty() {
		println!("No leads available");
	}
	for lead in &view.leads {
		println!("  {:<24} @{:<20} {}", lead.name, lead.handle, lead.profile_url());
	}
	if let Some(access) = &view.access {
		println!("Access: {}", access);
	}
	if let Some(message) = view
		.metadata
		.as_ref()
		.map(|m| m.message.as_str())
		.filter(|m| !m.is_empty())
	{
		println!("{}", message);
	}
}

/// Connects and prints the catalogue with current prices.
pub async fn prices(storefront: &Storefront) -> CommandResult {
	storefront.connect().await?;
	let view = storefront.view();
	let symbol = storefront.currency_symbol();
	if let Some(schedule) = &view.prices {
		println!(
			"Per-lead prices: base {}, medium {}, high {}, low {}",
			format_eth(schedule.base, symbol),
			format_eth(schedule.medium, symbol),
			format_eth(schedule.high, symbol),
			format_eth(schedule.low, symbol),
		);
	}
	print_packages(&view);
	Ok(())
}

/// Prints the leads list, optionally as the connected wallet sees it.
pub async fn leads(storefront: &Storefront, connect: bool) -> CommandResult {
	if connect {
		storefront.connect().await?;
		// Connecting swallows a failed leads reload; retry it once here.
		if storefront.view().leads_error.is_some() {
			storefront.refresh_leads().await?;
		}
	} else {
		storefront.refresh_leads().await?;
	}
	print_leads(&storefront.view());
	Ok(())
}

async fn confirm_prompt(quote: &PurchaseQuote, symbol: &str) -> Result<bool, std::io::Error> {
	let mut stdout = tokio::io::stdout();
	stdout
		.write_all(
			format!(
				"Buy {} leads ({} tier) for {}? [y/N] ",
				quote.lead_count,
				quote.tier,
				format_eth(quote.total, symbol)
			)
			.as_bytes(),
		)
		.await?;
	stdout.flush().await?;

	let mut line = String::new();
	BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
	Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Buys a package, asking for confirmation unless `yes` is set.
pub async fn buy(storefront: &Storefront, package_id: u32, yes: bool) -> CommandResult {
	let address = storefront.connect().await?;
	println!("Connected {}", address);

	let quote = storefront.select_package(package_id).await?;
	if !yes && !confirm_prompt(&quote, storefront.currency_symbol()).await? {
		storefront.cancel_purchase();
		println!("Purchase cancelled");
		return Ok(());
	}

	let outcome = storefront.confirm_purchase().await?;
	println!(
		"Purchased {} leads for {} in block {}",
		outcome.receipt.lead_count,
		format_eth(outcome.receipt.total_paid, storefront.currency_symbol()),
		outcome.receipt.block_number
	);
	match storefront.view().last_receipt_url {
		Some(url) => println!("Transaction: {}", url),
		None => println!("Transaction: {}", outcome.receipt.transaction_id),
	}
	if let Some(message) = outcome.refresh_error {
		println!("{}", message);
	}
	Ok(())
}

/// Prints the wallet, its native balance and its purchased leads.
pub async fn status(storefront: &Storefront) -> CommandResult {
	storefront.connect().await?;
	let native = storefront.gateway().native_balance().await?;
	let view = storefront.view();

	if let Some(wallet) = &view.wallet {
		println!("Wallet:     {} (chain {})", wallet.address, wallet.chain_id);
	}
	println!(
		"Balance:    {}",
		format_eth(native, storefront.currency_symbol())
	);
	if let Some(purchased) = view.purchased_balance {
		println!("Purchased:  {} leads", purchased);
	}
	println!("Leads:      {} visible", view.leads.len());
	if let Some(access) = &view.access {
		println!("Access:     {}", access);
	}
	Ok(())
}
