//! Gadget store CLI - query and edit the catalog's triple store from the shell.
//!
//! Usage:
//!   gadgetstore queries
//!   gadgetstore run order-list
//!   gadgetstore query 'SELECT ?p WHERE { ?p a ex:Product }'
//!   gadgetstore add-product iPhone15 --brand Apple --category Smartphone --label "iPhone 15"
//!   gadgetstore import batch.json

use clap::{Parser, Subcommand};
use gadgetstore::api::{CatalogApi, EntityAttributes};
use gadgetstore::core::EntityKind;
use gadgetstore::sources::relational_source::{JsonFileSource, SourceValue};
use gadgetstore::storage::util::StoreConfig;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gadgetstore")]
#[command(about = "Storefront catalog stored as triples, queried with graph patterns")]
struct Args {
    /// Turtle file the catalog is loaded from and saved to
    #[arg(short, long, env = "GADGETSTORE_DATA_FILE", default_value = "data_gadget.ttl")]
    data_file: PathBuf,

    /// Skip the class and property declarations
    #[arg(long)]
    no_seed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run query text given inline or read from a file
    Query {
        text: Option<String>,
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Run a named query
    Run { key: String },
    /// List the named queries
    Queries,
    /// Import a relational batch exported as JSON
    Import { batch: PathBuf },
    /// Print the store as Turtle
    Export,
    /// List entity ids of one kind (product, category, brand, customer, order)
    List { kind: EntityKind },
    /// Show every product with its label, brand and category
    Products,
    /// Show every customer with their name
    Customers,
    /// Statement and entity counts
    Stats,
    AddBrand { id: String },
    AddCategory { id: String },
    AddProduct {
        id: String,
        #[arg(long)]
        brand: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        label: Option<String>,
    },
    AddCustomer {
        id: String,
        #[arg(long)]
        name: String,
    },
    AddOrder {
        id: String,
        #[arg(long)]
        customer: String,
        #[arg(long)]
        total_price: String,
        /// ISO date, e.g. 2024-05-01
        #[arg(long)]
        order_date: String,
        /// Product ids, repeatable
        #[arg(long = "product", required = true)]
        products: Vec<String>,
    },
    /// Link two entities (hasBrand, belongsToCategory, purchasedBy, orderContains)
    Link { subject: String, predicate: String, object: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = StoreConfig { data_file: args.data_file, seed_schema: !args.no_seed, autosave: true };
    let mut catalog = CatalogApi::open(config)?;

    match args.command {
        Command::Query { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(path)?,
                (None, None) => return Err("query text or --file is required".into()),
            };
            print!("{}", catalog.run_query_text(&text)?);
        }
        Command::Run { key } => {
            print!("{}", catalog.run_named_query(&key)?);
        }
        Command::Queries => {
            for named in catalog.named_queries() {
                println!("{}\t{}\t{}", named.key, named.title, named.description);
            }
        }
        Command::Import { batch } => {
            let summary = catalog.import_from(&JsonFileSource::new(batch))?;
            println!(
                "Imported {} brands, {} categories, {} products, {} customers, {} orders, {} order links ({} new statements)",
                summary.brands,
                summary.categories,
                summary.products,
                summary.customers,
                summary.orders,
                summary.order_links,
                summary.statements_added
            );
        }
        Command::Export => print!("{}", catalog.export_turtle()?),
        Command::List { kind } => {
            for id in catalog.list_entities(kind) {
                println!("{}", id);
            }
        }
        Command::Products => print!("{}", catalog.product_overview()),
        Command::Customers => print!("{}", catalog.customer_overview()),
        Command::Stats => {
            let stats = catalog.stats();
            println!("statements\t{}", stats.statements);
            println!("products\t{}", stats.products);
            println!("categories\t{}", stats.categories);
            println!("brands\t{}", stats.brands);
            println!("customers\t{}", stats.customers);
            println!("orders\t{}", stats.orders);
            println!("named_queries\t{}", stats.named_queries);
        }
        Command::AddBrand { id } => add(&mut catalog, EntityKind::Brand, &id, EntityAttributes::default())?,
        Command::AddCategory { id } => {
            add(&mut catalog, EntityKind::Category, &id, EntityAttributes::default())?
        }
        Command::AddProduct { id, brand, category, label } => {
            let attrs =
                EntityAttributes { brand: Some(brand), category: Some(category), label, ..Default::default() };
            add(&mut catalog, EntityKind::Product, &id, attrs)?
        }
        Command::AddCustomer { id, name } => {
            let attrs = EntityAttributes { name: Some(name), ..Default::default() };
            add(&mut catalog, EntityKind::Customer, &id, attrs)?
        }
        Command::AddOrder { id, customer, total_price, order_date, products } => {
            let attrs = EntityAttributes {
                customer: Some(customer),
                total_price: Some(SourceValue::Text(total_price)),
                order_date: Some(order_date),
                products,
                ..Default::default()
            };
            add(&mut catalog, EntityKind::Order, &id, attrs)?
        }
        Command::Link { subject, predicate, object } => {
            catalog.insert_relationship(&subject, &predicate, &object)?;
            println!("Linked {} {} {}", subject, predicate, object);
        }
    }

    Ok(())
}

fn add(
    catalog: &mut CatalogApi,
    kind: EntityKind,
    id: &str,
    attrs: EntityAttributes,
) -> Result<(), Box<dyn std::error::Error>> {
    catalog.insert_entity(kind, id, &attrs)?;
    println!("{} {} added", kind, id);
    Ok(())
}
