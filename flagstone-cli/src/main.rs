//! Flagstone CLI - Feature-flag administration against a SQLite database.
//!
//! # Commands
//!
//! - `flagstone add-feature <name>` - Define a feature and its default
//! - `flagstone set-flag <feature>` - Set a customer/user override
//! - `flagstone set-global-flag <feature>` - Change the global default
//! - `flagstone resolve <feature>` - Resolve one flag decision
//! - `flagstone list-customers <feature>` - Effective customer set
//! - `flagstone describe-all-features` - Per-feature report
//!
//! Run `flagstone --help` for the full command set.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use flagstone_core::{CustomerId, FlagError, FlagResolver, UserId};
use flagstone_sqlite::SqliteFlagStore;
use std::fmt::Display;
use std::sync::Arc;

/// Flagstone CLI - Feature Flag Service Tools
#[derive(Parser)]
#[command(name = "flagstone")]
#[command(version)]
#[command(about = "🚦 Feature-flag resolution service CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, env = "FLAGSTONE_DB", default_value = "flagstone.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a customer
    AddCustomer { customer_id: CustomerId },

    /// Remove a customer and every override keyed to it
    RemoveCustomer { customer_id: CustomerId },

    /// Remove every override keyed to a user id, under any customer
    RemoveUser { user_id: UserId },

    /// Define a feature and its global default
    AddFeature {
        name: String,
        /// Enable the feature by default
        #[arg(long)]
        default_enabled: bool,
    },

    /// Remove a feature, its default, and all its overrides
    RemoveFeature { name: String },

    /// Rename a feature, moving its default and overrides atomically
    RenameFeature { old_name: String, new_name: String },

    /// Set an override for a customer or user scope
    SetFlag {
        feature: String,
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Remove the override for a customer or user scope
    ClearFlag {
        feature: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Change a feature's global default
    SetGlobalFlag {
        feature: String,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Resolve one flag decision
    Resolve {
        feature: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Customers for whom the feature currently resolves on
    ListCustomers { feature: String },

    /// Customers with an explicit customer-level enable
    ListCustomersEnabled { feature: String },

    /// Customers with an explicit customer-level disable
    ListCustomersDisabled { feature: String },

    /// Features visible to a customer
    ListFeatures { customer_id: CustomerId },

    /// All defined features
    ListAllFeatures,

    /// All registered customers
    ListAllCustomers,

    /// Per-feature report: default plus explicit customer overrides
    DescribeAllFeatures {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ScopeArgs {
    /// Customer scope
    #[arg(long)]
    customer_id: Option<CustomerId>,

    /// User scope (optionally combined with --customer-id)
    #[arg(long)]
    user_id: Option<UserId>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct StateArgs {
    /// Turn the flag on
    #[arg(long)]
    enabled: bool,

    /// Turn the flag off
    #[arg(long)]
    disabled: bool,
}

impl StateArgs {
    fn value(&self) -> bool {
        self.enabled
    }
}

fn print_each<I: IntoIterator<Item = T>, T: Display>(items: I) {
    for item in items {
        println!("{}", item);
    }
}

async fn run(cli: Cli) -> Result<(), FlagError> {
    let store = SqliteFlagStore::open(&cli.db)?;
    let flags = FlagResolver::new(Arc::new(store));

    match cli.command {
        Commands::AddCustomer { customer_id } => flags.add_customer(customer_id).await?,
        Commands::RemoveCustomer { customer_id } => flags.remove_customer(customer_id).await?,
        Commands::RemoveUser { user_id } => flags.remove_user(user_id).await?,
        Commands::AddFeature {
            name,
            default_enabled,
        } => flags.define_feature(&name, default_enabled).await?,
        Commands::RemoveFeature { name } => flags.remove_feature(&name).await?,
        Commands::RenameFeature { old_name, new_name } => {
            flags.rename_feature(&old_name, &new_name).await?
        }
        Commands::SetFlag {
            feature,
            scope,
            state,
        } => {
            flags
                .set_override(&feature, scope.customer_id, scope.user_id, state.value())
                .await?
        }
        Commands::ClearFlag { feature, scope } => {
            flags
                .remove_override(&feature, scope.customer_id, scope.user_id)
                .await?
        }
        Commands::SetGlobalFlag { feature, state } => {
            flags.set_global_default(&feature, state.value()).await?
        }
        Commands::Resolve { feature, scope } => {
            let enabled = flags
                .resolve(&feature, scope.customer_id, scope.user_id)
                .await?;
            println!("{}", enabled);
        }
        Commands::ListCustomers { feature } => {
            print_each(flags.list_customers_with_feature(&feature).await?)
        }
        Commands::ListCustomersEnabled { feature } => print_each(
            flags
                .list_customers_with_feature_explicitly_enabled(&feature)
                .await?,
        ),
        Commands::ListCustomersDisabled { feature } => print_each(
            flags
                .list_customers_with_feature_explicitly_disabled(&feature)
                .await?,
        ),
        Commands::ListFeatures { customer_id } => {
            print_each(flags.list_features_for_customer(customer_id).await?)
        }
        Commands::ListAllFeatures => print_each(flags.list_all_features().await?),
        Commands::ListAllCustomers => print_each(flags.list_all_customers().await?),
        Commands::DescribeAllFeatures { json } => {
            let reports = flags.describe_all_features().await?;
            if json {
                let rendered = serde_json::to_string_pretty(&reports)
                    .map_err(|e| FlagError::Storage(e.to_string()))?;
                println!("{}", rendered);
            } else {
                for report in reports {
                    println!(
                        "{} (default {}) enabled={:?} disabled={:?}",
                        report.feature_name,
                        if report.global_enabled { "on" } else { "off" },
                        report.explicitly_enabled_customers,
                        report.explicitly_disabled_customers,
                    );
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
